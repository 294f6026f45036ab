//! Error types for the `pdfchat-rag` crate.

use thiserror::Error;

/// Errors that can occur while indexing a document or answering a question.
#[derive(Debug, Error)]
pub enum RagError {
    /// The uploaded bytes could not be parsed as a PDF.
    #[error("Extraction error: {0}")]
    ExtractionError(String),

    /// The embedding service was unreachable or rejected the request.
    #[error("Embedding backend error ({model}): {message}")]
    EmbeddingBackendError {
        /// The embedding model the request was made with.
        model: String,
        /// A description of the failure.
        message: String,
    },

    /// The language-model service was unreachable or rejected the request.
    #[error("Inference backend error ({model}): {message}")]
    InferenceBackendError {
        /// The language model the request was made with.
        model: String,
        /// A description of the failure.
        message: String,
    },

    /// An operation was attempted before the session was ready for it.
    #[error("{0}")]
    PreconditionError(String),

    /// A query vector was produced by a different model than the index.
    #[error("Embedding model mismatch: index built with '{index_model}', query embedded with '{query_model}'")]
    EmbeddingModelMismatch {
        /// The model the index was built with.
        index_model: String,
        /// The model the query was embedded with.
        query_model: String,
    },

    /// An error occurred in the vector index.
    #[error("Vector index error: {0}")]
    VectorIndexError(String),

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl RagError {
    /// Whether this error came from an external service (embedding or inference).
    pub fn is_backend_error(&self) -> bool {
        matches!(self, Self::EmbeddingBackendError { .. } | Self::InferenceBackendError { .. })
    }
}

/// A convenience result type for pdfchat operations.
pub type Result<T> = std::result::Result<T, RagError>;
