//! Error types for docchat.
//!
//! This module defines a unified error enum that covers all error categories
//! in the application: configuration, ingestion, embedding, storage,
//! collection lifecycle, generation, and session coordination.

use thiserror::Error;

/// Unified error type for docchat.
///
/// All functions in the application return `Result<T, AppError>`.
/// We never panic; errors must be represented and propagated.
#[derive(Error, Debug)]
pub enum AppError {
    /// Invalid configuration (bad chunk parameters, unknown provider, ...)
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Document ingestion failed (unsupported format, extraction error)
    #[error("Ingestion error: {0}")]
    Ingestion(String),

    /// Embedding provider failure during a collection build or a query
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Persistence failure in the vector index backing storage
    #[error("Storage error: {0}")]
    Storage(String),

    /// A collection exists with a different embedding dimension
    #[error("Dimension conflict for collection '{collection}': expected {expected}, got {actual}")]
    DimensionConflict {
        collection: String,
        expected: usize,
        actual: usize,
    },

    /// Query against a collection that has not been marked ready
    #[error("Collection not ready: {0}")]
    NotReady(String),

    /// Query or delete against an absent collection; recoverable
    #[error("Not found: {0}")]
    NotFound(String),

    /// Language-model call failure (expansion or synthesis)
    #[error("Generation error: {0}")]
    Generation(String),

    /// Conflicting concurrent build or delete on the same session
    #[error("Session busy: {0}")]
    SessionBusy(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl AppError {
    /// Whether this error leaves the caller free to retry or continue.
    ///
    /// `NotFound` from a repeated delete and `SessionBusy` from a
    /// concurrent build are conditions, not faults.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, AppError::NotFound(_) | AppError::SessionBusy(_))
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = AppError::DimensionConflict {
            collection: "doc-abc".to_string(),
            expected: 768,
            actual: 384,
        };
        let msg = err.to_string();
        assert!(msg.contains("doc-abc"));
        assert!(msg.contains("768"));
        assert!(msg.contains("384"));
    }

    #[test]
    fn test_recoverable_classification() {
        assert!(AppError::NotFound("doc-abc".to_string()).is_recoverable());
        assert!(AppError::SessionBusy("build in progress".to_string()).is_recoverable());
        assert!(!AppError::Config("overlap >= size".to_string()).is_recoverable());
        assert!(!AppError::Generation("model unavailable".to_string()).is_recoverable());
    }
}
