//! Embedding capability seam.
//!
//! The core treats embedding as a black box with an explicit contract:
//! [`EmbeddingProvider::embed_batch`] is order-preserving and fails as a
//! whole batch on provider error. Concrete backends live behind the trait —
//! the HTTP [`openai::OpenAiEmbeddingProvider`] for production, a
//! deterministic [`MockEmbeddingProvider`] for tests and offline runs.

pub mod openai;

use async_trait::async_trait;

use crate::types::RagError;

pub use openai::OpenAiEmbeddingProvider;

/// Text → fixed-dimension vector, batched.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Identifier of the underlying embedding model, for telemetry.
    fn model_id(&self) -> &str;

    /// Embeds `texts`, returning one vector per input in input order.
    ///
    /// A provider error fails the whole batch; partial results are never
    /// returned.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError>;
}

/// Deterministic hash-derived embeddings for tests and offline pipelines.
///
/// The same text always maps to the same vector and distinct texts map to
/// distinct vectors with overwhelming probability, which is enough to
/// exercise ranking, filtering, and id bookkeeping without a network
/// dependency.
#[derive(Debug, Clone)]
pub struct MockEmbeddingProvider {
    dimensions: usize,
}

impl Default for MockEmbeddingProvider {
    fn default() -> Self {
        Self { dimensions: 8 }
    }
}

impl MockEmbeddingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the vector dimension (default 8).
    #[must_use]
    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = dimensions;
        self
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        let seed = hasher.finish();
        (0..self.dimensions)
            .map(|i| {
                let bits = seed.rotate_left((i % 8) as u32 * 8) ^ ((i as u64) << 17);
                (bits % 10_000) as f32 / 10_000.0
            })
            .collect()
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    fn model_id(&self) -> &str {
        "mock-embedding"
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
        Ok(texts.iter().map(|text| self.embed_one(text)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_embeddings_are_deterministic() {
        let provider = MockEmbeddingProvider::new();
        let inputs = vec![
            "Hello world".to_string(),
            "Goodbye world".to_string(),
            "Hello world".to_string(),
        ];

        let first = provider.embed_batch(&inputs).await.unwrap();
        let second = provider.embed_batch(&inputs).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first[0], first[2]);
        assert_ne!(first[0], first[1]);
    }

    #[tokio::test]
    async fn mock_dimension_is_configurable() {
        let provider = MockEmbeddingProvider::new().with_dimensions(16);
        let out = provider
            .embed_batch(&["text".to_string()])
            .await
            .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].len(), 16);
    }
}
