//! Error types for the workflow editor
//!
//! Editing and run-tracking operations never fail; these errors only surface
//! at the persistence, configuration and explicit-validation boundaries.

use thiserror::Error;

use crate::validation::ValidationError;

/// Result type alias using EditorError
pub type Result<T> = std::result::Result<T, EditorError>;

/// Errors that can occur at the editor's boundaries
#[derive(Debug, Error)]
pub enum EditorError {
    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A kind name that is not in the catalog
    #[error("Unknown node kind: {0}")]
    UnknownNodeKind(String),

    /// Rejected configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Graph failed integrity checks
    #[error("Graph validation failed with {} error(s)", .0.len())]
    Validation(Vec<ValidationError>),
}

impl EditorError {
    /// Create an invalid configuration error with a message
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
