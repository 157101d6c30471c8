//! Error types for the gainz_core library.

use crate::types::SessionId;
use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Result type returned by repository implementations
pub type RepositoryResult<T> = std::result::Result<T, RepositoryError>;

/// Core error type for gainz_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Catalog validation error
    #[error("Catalog validation error: {0}")]
    CatalogValidation(String),

    /// A set record violates its value constraints
    #[error("Invalid set: {0}")]
    InvalidSet(String),

    /// A workout session violates its invariants
    #[error("Invalid session: {0}")]
    InvalidSession(String),

    /// A plan violates its invariants
    #[error("Invalid plan: {0}")]
    InvalidPlan(String),

    /// Plan generation or periodization could not produce a plan
    #[error("Planning error: {0}")]
    Planning(String),

    #[error("Workout session {0} not found")]
    SessionNotFound(SessionId),

    #[error("Workout session {0} is already finished")]
    SessionNotActive(SessionId),

    /// Storage backend failure
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Failures reported by repository implementations
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Persistence failed: {0}")]
    PersistenceFailed(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Record not found")]
    NotFound,

    #[error("Unknown repository error: {0}")]
    Unknown(String),
}

impl RepositoryError {
    pub fn persistence(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        RepositoryError::PersistenceFailed(err.into())
    }
}

impl From<io::Error> for RepositoryError {
    fn from(err: io::Error) -> Self {
        RepositoryError::persistence(err)
    }
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        RepositoryError::persistence(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_converts_into_core_error() {
        let err: Error = RepositoryError::NotFound.into();
        assert!(matches!(err, Error::Repository(RepositoryError::NotFound)));
        assert_eq!(err.to_string(), "Record not found");
    }

    #[test]
    fn test_io_error_becomes_persistence_failure() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "read-only");
        let err = RepositoryError::from(io_err);
        assert!(matches!(err, RepositoryError::PersistenceFailed(_)));
        assert_eq!(err.to_string(), "Persistence failed: read-only");
    }
}
