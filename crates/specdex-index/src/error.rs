//! Error types for specdex-index.

use std::num::TryFromIntError;

/// Errors that can occur while chunking, ingesting, or loading documents.
///
/// Malformed specification nodes are not errors: extraction skips them and
/// reports a count instead.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// Invalid setup that must abort startup (tokenizer vocabulary, chunk limits).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Vector store failure; see [`specdex_memory::VectorStoreError::is_retryable`].
    #[error("storage error: {0}")]
    Storage(#[from] specdex_memory::VectorStoreError),

    /// Embedding provider failure.
    #[error("embedding error: {0}")]
    Embedding(#[from] specdex_llm::LlmError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("integer conversion failed: {0}")]
    IntConversion(#[from] TryFromIntError),

    #[error("{0}")]
    Other(String),
}

/// Result type alias using `IndexError`.
pub type Result<T> = std::result::Result<T, IndexError>;
