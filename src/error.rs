//! Board error type.
//!
//! Every failing command returns a [`BoardError`] and leaves the board
//! exactly as it was. None of these are fatal.

use thiserror::Error;

use crate::models::RegistryKind;

/// Errors reported by board commands and collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    /// Submitted job failed validation.
    #[error("validation failed: {0}")]
    Validation(String),

    /// No job with this ID exists.
    #[error("job not found: {0}")]
    JobNotFound(String),

    /// The target label already exists in the registry.
    #[error("{kind} '{label}' already exists")]
    DuplicateLabel { kind: RegistryKind, label: String },

    /// A label was empty or whitespace.
    #[error("{0} name must not be blank")]
    BlankLabel(RegistryKind),

    /// The label to rename or delete is not registered.
    #[error("{kind} '{label}' not found")]
    LabelNotFound { kind: RegistryKind, label: String },

    /// Undo was requested with an empty history.
    #[error("nothing to undo")]
    NothingToUndo,

    /// Storage could not be written.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Result alias for board operations.
pub type BoardResult<T> = Result<T, BoardError>;

impl From<serde_json::Error> for BoardError {
    fn from(e: serde_json::Error) -> Self {
        Self::Persistence(e.to_string())
    }
}

impl From<std::io::Error> for BoardError {
    fn from(e: std::io::Error) -> Self {
        Self::Persistence(e.to_string())
    }
}
