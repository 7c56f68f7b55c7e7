//! Shared error taxonomy for the retrieval core.
//!
//! Every fallible operation in the crate surfaces one of the [`RagError`]
//! kinds below. Collaborator failures (HTTP transport, provider payloads) are
//! wrapped into [`RagError::Provider`] at the boundary so no third-party error
//! type leaks past a component seam.

use thiserror::Error;

/// Structured error kinds for chunking, storage, and provider orchestration.
#[derive(Debug, Clone, Error)]
pub enum RagError {
    /// Invalid chunking or engine configuration (e.g. overlap >= chunk size).
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// Chunk/embedding count mismatch, or a vector whose length does not
    /// match the store dimension.
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// An insert would reuse a chunk id already present in the store.
    #[error("duplicate chunk id: {0}")]
    DuplicateId(String),

    /// Lookup of a document id that is not present in the store.
    #[error("document not found: {0}")]
    NotFound(String),

    /// Embedding or generation capability failure, including timeouts.
    #[error("provider failure: {0}")]
    Provider(String),
}

impl From<reqwest::Error> for RagError {
    fn from(err: reqwest::Error) -> Self {
        RagError::Provider(err.to_string())
    }
}
