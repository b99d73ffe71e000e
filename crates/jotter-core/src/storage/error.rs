//! Storage error handling
//!
//! Provides typed errors for storage operations with descriptive messages
//! and recovery suggestions.
//!
//! Errors fall in two classes:
//! - initialization errors: the database or its table could not be opened or
//!   created; every operation depending on the handle fails until the
//!   environment is fixed
//! - query errors: a single statement failed

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to create data directory
    #[error("Failed to create data directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The database could not be opened or created
    #[error("Failed to open database '{location}': {source}")]
    Open {
        location: String,
        #[source]
        source: rusqlite::Error,
    },

    /// The notes table could not be created
    #[error("Failed to create notes table: {0}")]
    Schema(#[source] rusqlite::Error),

    /// A statement failed
    #[error("Database error: {0}")]
    Query(#[from] rusqlite::Error),

    /// The blocking task running a statement panicked or was cancelled
    #[error("Database task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl StorageError {
    /// Whether the database handle itself could not be established
    pub fn is_init(&self) -> bool {
        matches!(
            self,
            StorageError::CreateDirectory { .. }
                | StorageError::Open { .. }
                | StorageError::Schema(_)
        )
    }

    /// SQLite extended result code, when the engine reported one
    pub fn code(&self) -> Option<i32> {
        let sqlite_error = match self {
            StorageError::Open { source, .. } => source,
            StorageError::Schema(source) | StorageError::Query(source) => source,
            StorageError::CreateDirectory { .. } | StorageError::Task(_) => return None,
        };

        match sqlite_error {
            rusqlite::Error::SqliteFailure(failure, _) => Some(failure.extended_code),
            _ => None,
        }
    }

    /// Get a recovery suggestion for this error
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            StorageError::CreateDirectory { .. } => {
                Some("Check that the parent directory exists and you have write permissions.")
            }
            StorageError::Open { .. } => {
                Some("Check that the database file is readable and writable, or point data_dir somewhere else.")
            }
            StorageError::Schema(_) => {
                Some("The database file may be corrupted or read-only. Move it aside to start fresh.")
            }
            _ => None,
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
