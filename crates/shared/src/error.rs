use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::EntityKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The store could not be reached. Fatal at startup.
    Connection,
    /// Malformed statement or constraint violation.
    Query,
    /// A display name or id matched no row.
    NotFound,
    /// Operator input was rejected.
    Validation,
    /// The operator cancelled the prompt or closed the input stream.
    Interrupted,
    /// Reading from or writing to the terminal failed.
    Terminal,
}

#[derive(Debug, Clone, Error)]
#[error("{code:?}: {message}")]
pub struct ActionError {
    pub code: ErrorCode,
    pub message: String,
}

impl ActionError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn connection(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Connection, message)
    }

    pub fn query(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Query, message)
    }

    pub fn not_found(kind: EntityKind, name: impl AsRef<str>) -> Self {
        Self::new(
            ErrorCode::NotFound,
            format!("no {kind} named '{}'", name.as_ref()),
        )
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Validation, message)
    }

    pub fn interrupted() -> Self {
        Self::new(ErrorCode::Interrupted, "prompt cancelled")
    }

    pub fn terminal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Terminal, message)
    }

    pub fn is_interrupted(&self) -> bool {
        self.code == ErrorCode::Interrupted
    }
}
