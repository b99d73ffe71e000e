//! Errors returned by the notes store

use thiserror::Error;

use crate::events::{Notice, FAILURE_MESSAGE};
use crate::models::ValidationError;
use crate::storage::StorageError;

/// Why a store operation failed
#[derive(Error, Debug)]
pub enum NotesError {
    /// The request was rejected before reaching storage
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Storage ran the statement but no note matched
    #[error("Note not found: {id}")]
    NotFound { id: String },

    /// The database could not be opened or a statement failed
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl NotesError {
    /// The notification to show the user for this failure
    pub fn notice(&self) -> Notice {
        match self {
            NotesError::Validation(err) => Notice::new(err.to_string()),
            NotesError::NotFound { .. } => Notice::new(FAILURE_MESSAGE),
            NotesError::Storage(err) => {
                let message = err.to_string();
                let message = if message.is_empty() {
                    FAILURE_MESSAGE.to_string()
                } else {
                    message
                };
                Notice::new(message).with_code(err.code())
            }
        }
    }
}

/// Result type for store operations
pub type NotesResult<T> = Result<T, NotesError>;
