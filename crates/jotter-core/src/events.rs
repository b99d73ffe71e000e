//! Progress events published by the notes store
//!
//! Every store operation announces when it starts and how it ended. The
//! presentation layer subscribes to drive loading indicators and to show
//! failure notices; the operation's own `Result` carries the outcome too.

use std::fmt;

use serde::Serialize;

/// Message shown when an operation completes without doing anything
pub const FAILURE_MESSAGE: &str = "Something went wrong. Please try again.";

/// The store operation an event refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    LoadPage,
    Create,
    Update,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::LoadPage => "load page",
            Operation::Create => "create note",
            Operation::Update => "update note",
            Operation::Delete => "delete note",
        };
        f.write_str(name)
    }
}

/// User-facing description of a failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub message: String,
    /// Engine error code, when the storage engine reported one
    pub code: Option<i32>,
}

impl Notice {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
        }
    }

    pub fn with_code(mut self, code: Option<i32>) -> Self {
        self.code = code;
        self
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "Error {}: {}", code, self.message),
            None => write!(f, "Error: {}", self.message),
        }
    }
}

/// Lifecycle of a single store operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StoreEvent {
    /// The operation has started
    Requested { operation: Operation },
    /// Storage succeeded and the state has been updated
    Succeeded { operation: Operation },
    /// The operation failed; `notice` is meant for the user
    Failed { operation: Operation, notice: Notice },
}

impl StoreEvent {
    pub fn operation(&self) -> Operation {
        match self {
            StoreEvent::Requested { operation }
            | StoreEvent::Succeeded { operation }
            | StoreEvent::Failed { operation, .. } => *operation,
        }
    }
}
