//! Engine facade tying the store and both pipelines together.

use std::sync::Arc;

use crate::chunking::{PageText, TextChunker};
use crate::config::EngineConfig;
use crate::embeddings::EmbeddingProvider;
use crate::generation::GenerationProvider;
use crate::pipeline::{
    AnswerOutcome, DocumentMetadata, IngestReport, IngestionPipeline, RetrievalPipeline,
};
use crate::stores::{DocumentInfo, MemoryVectorStore};
use crate::types::RagError;

/// The retrieval core's public entry points: ingest, answer, delete, list,
/// count, and per-document detail.
///
/// The engine owns the vector store and passes it by handle to both
/// pipelines; request handlers hold one `RagEngine` (or an `Arc` of it) and
/// never touch ambient global state. Providers are chosen once at
/// construction.
///
/// # Examples
///
/// ```rust,ignore
/// use ragforge::engine::RagEngine;
/// use ragforge::embeddings::MockEmbeddingProvider;
/// use ragforge::generation::MockGenerationProvider;
/// use std::sync::Arc;
///
/// let engine = RagEngine::builder()
///     .embedder(Arc::new(MockEmbeddingProvider::new()))
///     .generator(Arc::new(MockGenerationProvider::new()))
///     .build()?;
/// ```
pub struct RagEngine {
    store: Arc<MemoryVectorStore>,
    ingestion: IngestionPipeline,
    retrieval: RetrievalPipeline,
    default_top_k: usize,
}

impl RagEngine {
    pub fn builder() -> RagEngineBuilder {
        RagEngineBuilder::default()
    }

    /// Chunks, embeds, and stores one document. See
    /// [`IngestionPipeline::ingest`].
    pub async fn ingest(
        &self,
        pages: &[PageText],
        metadata: DocumentMetadata,
    ) -> Result<IngestReport, RagError> {
        self.ingestion.ingest(pages, metadata).await
    }

    /// Answers a question from the stored chunks. `top_k` falls back to the
    /// configured default when unset.
    pub async fn answer(
        &self,
        question: &str,
        top_k: Option<usize>,
        document_id: Option<&str>,
    ) -> Result<AnswerOutcome, RagError> {
        self.retrieval
            .answer(question, top_k.unwrap_or(self.default_top_k), document_id)
            .await
    }

    /// Deletes a document and all of its chunks. Returns `false` when the id
    /// was not present (idempotent, not an error).
    pub fn delete(&self, document_id: &str) -> bool {
        self.store.delete_document(document_id) > 0
    }

    /// Every distinct document id currently stored.
    pub fn list(&self) -> Vec<String> {
        self.store.list_documents()
    }

    /// Total stored chunk count, across all documents.
    pub fn count(&self) -> usize {
        self.store.document_count()
    }

    /// Detail for one document; `NotFound` for an unknown id.
    pub fn document_info(&self, document_id: &str) -> Result<DocumentInfo, RagError> {
        self.store.document_info(document_id)
    }

    /// Shared handle to the underlying store.
    pub fn store(&self) -> Arc<MemoryVectorStore> {
        Arc::clone(&self.store)
    }
}

/// Builder for [`RagEngine`].
#[derive(Default)]
pub struct RagEngineBuilder {
    config: EngineConfig,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    generator: Option<Arc<dyn GenerationProvider>>,
    store: Option<Arc<MemoryVectorStore>>,
}

impl RagEngineBuilder {
    #[must_use]
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the embedding provider. Required.
    #[must_use]
    pub fn embedder(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Set the generation provider. Required.
    #[must_use]
    pub fn generator(mut self, generator: Arc<dyn GenerationProvider>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Use an existing store instead of a fresh one. Lets tests and
    /// multi-engine setups share state explicitly.
    #[must_use]
    pub fn store(mut self, store: Arc<MemoryVectorStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn build(self) -> Result<RagEngine, RagError> {
        self.config.validate()?;
        let embedder = self.embedder.ok_or_else(|| {
            RagError::Configuration("an embedding provider is required".to_string())
        })?;
        let generator = self.generator.ok_or_else(|| {
            RagError::Configuration("a generation provider is required".to_string())
        })?;
        let store = self.store.unwrap_or_default();

        let chunker = TextChunker::new(self.config.chunker)?;
        let ingestion = IngestionPipeline::new(
            chunker,
            Arc::clone(&embedder),
            Arc::clone(&store),
            self.config.embed_batch_size,
            self.config.provider_timeout,
        );
        let retrieval = RetrievalPipeline::new(
            embedder,
            generator,
            Arc::clone(&store),
            self.config.source_preview_chars,
            self.config.provider_timeout,
        );

        Ok(RagEngine {
            store,
            ingestion,
            retrieval,
            default_top_k: self.config.top_k,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::MockEmbeddingProvider;
    use crate::generation::MockGenerationProvider;

    #[test]
    fn build_requires_both_providers() {
        let missing_both = RagEngine::builder().build();
        assert!(matches!(missing_both, Err(RagError::Configuration(_))));

        let missing_generator = RagEngine::builder()
            .embedder(Arc::new(MockEmbeddingProvider::new()))
            .build();
        assert!(matches!(missing_generator, Err(RagError::Configuration(_))));
    }

    #[test]
    fn build_rejects_invalid_config() {
        let config = EngineConfig {
            embed_batch_size: 0,
            ..Default::default()
        };
        let result = RagEngine::builder()
            .config(config)
            .embedder(Arc::new(MockEmbeddingProvider::new()))
            .generator(Arc::new(MockGenerationProvider::new()))
            .build();
        assert!(matches!(result, Err(RagError::Configuration(_))));
    }
}
