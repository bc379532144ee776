//! Error types for the bias diagnostics service
//!
//! This module provides structured error definitions using thiserror, with
//! anyhow available for error propagation at the binary boundary.

use thiserror::Error;

/// Main error type for biascope operations
#[derive(Error, Debug)]
pub enum BiascopeError {
    /// Database operation failed
    #[error("Database error: {0}")]
    Database(String),

    /// Database migration failed
    #[error("Migration error: {0}")]
    Migration(String),

    /// Evaluation not found
    #[error("Evaluation with id {0} not found")]
    EvaluationNotFound(String),

    /// Heuristic finding not found for an evaluation
    #[error("Heuristic finding '{heuristic_type}' not found for evaluation {evaluation_id}")]
    FindingNotFound {
        evaluation_id: String,
        heuristic_type: String,
    },

    /// Recommendation not found
    #[error("Recommendation with id {0} not found")]
    RecommendationNotFound(String),

    /// Baseline not found
    #[error("Baseline with id {0} not found")]
    BaselineNotFound(String),

    /// Input failed validation before persistence
    #[error("Validation error: {0}")]
    Validation(String),

    /// Invalid identifier format
    #[error("Invalid identifier: {0}")]
    InvalidId(#[from] uuid::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

/// Result type alias for biascope operations
pub type Result<T> = std::result::Result<T, BiascopeError>;

impl From<libsql::Error> for BiascopeError {
    fn from(err: libsql::Error) -> Self {
        BiascopeError::Database(err.to_string())
    }
}

/// Convert anyhow::Error to BiascopeError
impl From<anyhow::Error> for BiascopeError {
    fn from(err: anyhow::Error) -> Self {
        BiascopeError::Other(err.to_string())
    }
}

impl BiascopeError {
    /// Whether this error maps to a missing resource
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            BiascopeError::EvaluationNotFound(_)
                | BiascopeError::FindingNotFound { .. }
                | BiascopeError::RecommendationNotFound(_)
                | BiascopeError::BaselineNotFound(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BiascopeError::EvaluationNotFound("test-id".to_string());
        assert_eq!(err.to_string(), "Evaluation with id test-id not found");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_validation_is_not_not_found() {
        let err = BiascopeError::Validation("iteration_count out of range".to_string());
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_error_conversion() {
        let uuid_err = uuid::Uuid::parse_str("invalid");
        assert!(uuid_err.is_err());

        let err: BiascopeError = uuid_err.unwrap_err().into();
        assert!(matches!(err, BiascopeError::InvalidId(_)));
    }
}
