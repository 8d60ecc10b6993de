//! # Gripe Error Types
//!
//! Centralized error handling for the gripe core library.

use std::path::PathBuf;
use thiserror::Error;

use gripe_types::ValidationError;

/// Result type alias for gripe operations
pub type Result<T> = std::result::Result<T, GripeError>;

/// Core error types for gripe
#[derive(Error, Debug)]
pub enum GripeError {
    /// Lookup by ID missed, or an update targeted an unknown ID
    #[error("Not found: {0}")]
    NotFound(String),

    /// File system failure, with the path that was being touched
    #[error("Storage error at {}: {source}", path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON encode/decode errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Record failed its own validation rules
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Invalid input errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Operation conflicts with the current record state
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Background task failures
    #[error("Task error: {0}")]
    Task(String),
}

impl GripeError {
    /// Create a new not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a new storage error for `path`
    pub fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }

    /// Create a new configuration error
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a new invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a new conflict error
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Whether this error means the requested record does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<tokio::task::JoinError> for GripeError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Task(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_keeps_path_and_source() {
        let err = GripeError::storage(
            "/tmp/x.json",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let msg = err.to_string();
        assert!(msg.contains("/tmp/x.json"));
        assert!(msg.contains("denied"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_is_not_found() {
        assert!(GripeError::not_found("abc").is_not_found());
        assert!(!GripeError::conflict("abc").is_not_found());
    }
}
