//! # Error Types — Structured Error Hierarchy
//!
//! All errors use `thiserror` for derive-based `Display` and `Error`
//! implementations.
//!
//! The resolver and the evaluator never produce errors: a threshold that
//! cannot be found or a value that cannot be compared folds into a default
//! status. Errors only arise at the edges: constructing identifiers, parsing
//! records and reading files.

use thiserror::Error;

/// Top-level error type for envsafe.
#[derive(Error, Debug)]
pub enum SafetyError {
    /// An identifier or record failed validation.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A record does not match the expected schema.
    #[error("schema validation error: {0}")]
    SchemaValidation(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Validation errors for identifier newtypes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Jurisdiction code is empty or whitespace-only.
    #[error("invalid jurisdiction code: must be non-empty")]
    InvalidJurisdictionCode,

    /// Entity identifier is empty or whitespace-only.
    #[error("invalid entity id: must be non-empty")]
    InvalidEntityId,
}
