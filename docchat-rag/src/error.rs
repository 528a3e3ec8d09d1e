//! Error types for the `docchat-rag` crate.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur in RAG operations.
#[derive(Debug, Error)]
pub enum RagError {
    /// A request field was missing or malformed.
    #[error("{0}")]
    Validation(String),

    /// No API key could be resolved for the embedding or completion service.
    #[error("No API key provided: pass apiKey or set {primary_env}")]
    MissingCredential {
        /// The primary environment variable consulted during resolution.
        primary_env: String,
    },

    /// One or more requested sources could not be read.
    #[error("Some sources could not be read: {}", missing.join(", "))]
    MissingSources {
        /// The identifiers that were missing or unreadable, in request order.
        missing: Vec<String>,
    },

    /// The pipeline produced nothing usable.
    #[error("{0}")]
    EmptyResult(String),

    /// A search targeted a collection that was never ingested into.
    #[error("Vector collection '{collection}' not found")]
    CollectionNotFound {
        /// The sanitized collection name.
        collection: String,
    },

    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred in the vector store backend.
    #[error("Vector store error ({backend}): {message}")]
    VectorStoreError {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// The chat-completion call failed.
    #[error("Completion error ({provider}): {message}")]
    CompletionError {
        /// The completion provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The completion call succeeded but its content was not plain text.
    #[error("Invalid completion response: {0}")]
    InvalidCompletionResponse(String),

    /// An external call did not finish within its deadline.
    #[error("{service} call timed out after {after:?}")]
    Timeout {
        /// The external service that timed out.
        service: String,
        /// The deadline that elapsed.
        after: Duration,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl RagError {
    /// Returns `true` for failures of an external service call
    /// (embedding, vector store or completion).
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            RagError::EmbeddingError { .. }
                | RagError::VectorStoreError { .. }
                | RagError::CompletionError { .. }
        )
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        RagError::Validation(message.into())
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_service_failures_are_upstream() {
        assert!(RagError::VectorStoreError { backend: "qdrant".into(), message: "down".into() }.is_upstream());
        assert!(RagError::CompletionError { provider: "OpenAI".into(), message: "429".into() }.is_upstream());
        assert!(!RagError::ConfigError("bad".into()).is_upstream());
        assert!(!RagError::Timeout { service: "embedding".into(), after: Duration::from_secs(1) }.is_upstream());
    }
}
