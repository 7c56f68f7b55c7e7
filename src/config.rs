//! Configuration for the chunker and the engine facade.
//!
//! Defaults mirror the values the retrieval core was tuned with: 1000-char
//! chunks with 200-char overlap, embedding batches of 100, five retrieved
//! chunks per question, 500-char source previews.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::RagError;

/// Upper bound accepted for `top_k` at the engine boundary.
pub const MAX_TOP_K: usize = 20;

/// Sizing knobs for [`crate::chunking::TextChunker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkerConfig {
    /// Maximum chunk length, in Unicode scalar values.
    pub chunk_size: usize,
    /// Overlap carried between consecutive chunks, in Unicode scalar values.
    pub chunk_overlap: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

impl ChunkerConfig {
    /// Checks the invariant `0 < chunk_overlap < chunk_size`.
    pub fn validate(&self) -> Result<(), RagError> {
        if self.chunk_size == 0 {
            return Err(RagError::Configuration(
                "chunk_size must be greater than 0".to_string(),
            ));
        }
        if self.chunk_overlap == 0 {
            return Err(RagError::Configuration(
                "chunk_overlap must be greater than 0".to_string(),
            ));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(RagError::Configuration(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

/// Configuration shared by the ingestion and retrieval pipelines.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub chunker: ChunkerConfig,
    /// Number of texts sent to the embedding provider per request.
    pub embed_batch_size: usize,
    /// Default number of chunks retrieved per question when the caller does
    /// not specify one.
    pub top_k: usize,
    /// Display truncation length for source previews, in Unicode scalar
    /// values. Full text is always sent to generation.
    pub source_preview_chars: usize,
    /// Upper bound for a single embedding or generation call.
    pub provider_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            chunker: ChunkerConfig::default(),
            embed_batch_size: 100,
            top_k: 5,
            source_preview_chars: 500,
            provider_timeout: Duration::from_secs(60),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), RagError> {
        self.chunker.validate()?;
        if self.embed_batch_size == 0 {
            return Err(RagError::Configuration(
                "embed_batch_size must be greater than 0".to_string(),
            ));
        }
        if self.top_k == 0 || self.top_k > MAX_TOP_K {
            return Err(RagError::Configuration(format!(
                "top_k must be between 1 and {MAX_TOP_K}"
            )));
        }
        if self.provider_timeout.is_zero() {
            return Err(RagError::Configuration(
                "provider_timeout must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}
