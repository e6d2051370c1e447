//! Error types for promptv core operations.
//!
//! Every failure surfaced by the core falls into exactly one [`ErrorKind`].
//! Callers (CLI, SDK consumers) branch on [`PromptvError::kind`] and map the
//! kinds to user-facing behavior; the core itself never prints.

use std::io;

use thiserror::Error;

/// Result type alias for promptv operations.
pub type Result<T> = std::result::Result<T, PromptvError>;

/// Core error type for promptv operations.
#[derive(Debug, Clone, Error)]
pub enum PromptvError {
    /// Missing project, prompt, version or tag
    #[error("Not found: {0}")]
    NotFound(String),

    /// Duplicate tag or create-only conflict
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Unparseable version reference or invalid name
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    /// Storage backend error
    #[error("Storage error: {message}")]
    Storage { message: String, transient: bool },

    /// Torn or inconsistent persisted state
    #[error("Concurrency conflict: {0}")]
    ConcurrencyConflict(String),
}

/// Discriminant of [`PromptvError`], for callers that only need to branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    AlreadyExists,
    InvalidReference,
    StorageFailure,
    ConcurrencyConflict,
}

impl PromptvError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PromptvError::NotFound(_) => ErrorKind::NotFound,
            PromptvError::AlreadyExists(_) => ErrorKind::AlreadyExists,
            PromptvError::InvalidReference(_) => ErrorKind::InvalidReference,
            PromptvError::Storage { .. } => ErrorKind::StorageFailure,
            PromptvError::ConcurrencyConflict(_) => ErrorKind::ConcurrencyConflict,
        }
    }

    /// Persistent storage failure.
    pub fn storage(message: impl Into<String>) -> Self {
        PromptvError::Storage {
            message: message.into(),
            transient: false,
        }
    }

    /// Whether retrying the same operation may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, PromptvError::Storage { transient: true, .. })
    }
}

impl From<io::Error> for PromptvError {
    fn from(err: io::Error) -> Self {
        let transient = matches!(
            err.kind(),
            io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
        );
        PromptvError::Storage {
            message: err.to_string(),
            transient,
        }
    }
}

impl From<serde_json::Error> for PromptvError {
    fn from(err: serde_json::Error) -> Self {
        PromptvError::storage(format!("Malformed record: {}", err))
    }
}
