//! Drives chunking → embedding → storage for one document.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::chunking::{PageText, TextChunker};
use crate::embeddings::EmbeddingProvider;
use crate::stores::{MemoryVectorStore, MetadataMap};
use crate::types::RagError;

/// Document-level metadata supplied by the extraction step.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub filename: String,
    pub title: Option<String>,
    pub author: Option<String>,
}

impl DocumentMetadata {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            ..Default::default()
        }
    }
}

/// Result of one successful ingestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReport {
    pub document_id: String,
    pub filename: String,
    pub title: Option<String>,
    pub author: Option<String>,
    pub num_pages: usize,
    pub num_chunks: usize,
}

/// Orchestrates one document through chunk → embed → store.
///
/// Each step is a hard dependency on the previous one succeeding; the store
/// is touched exactly once, after every embedding for the document is in
/// hand, so a failure at any stage leaves no partial document behind.
pub struct IngestionPipeline {
    chunker: TextChunker,
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<MemoryVectorStore>,
    batch_size: usize,
    provider_timeout: Duration,
}

impl IngestionPipeline {
    pub fn new(
        chunker: TextChunker,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<MemoryVectorStore>,
        batch_size: usize,
        provider_timeout: Duration,
    ) -> Self {
        Self {
            chunker,
            embedder,
            store,
            batch_size,
            provider_timeout,
        }
    }

    /// Ingests one document's pages under a fresh document id.
    ///
    /// Re-ingesting the same filename produces a new, distinct id; there is
    /// no dedup by content.
    pub async fn ingest(
        &self,
        pages: &[PageText],
        metadata: DocumentMetadata,
    ) -> Result<IngestReport, RagError> {
        let document_id = fresh_document_id();
        tracing::info!(%document_id, filename = %metadata.filename, "starting ingestion");

        let chunks = self.chunker.chunk_pages(pages);
        tracing::debug!(%document_id, chunks = chunks.len(), "chunked pages");

        let texts: Vec<String> = chunks.iter().map(|chunk| chunk.text.clone()).collect();
        let embeddings = self.embed_all(&texts).await?;

        let mut extra = MetadataMap::new();
        extra.insert("filename".to_string(), metadata.filename.clone().into());
        extra.insert("num_pages".to_string(), (pages.len() as u64).into());
        self.store
            .add_documents(&chunks, &embeddings, &document_id, Some(&extra))?;

        tracing::info!(%document_id, chunks = chunks.len(), "ingestion complete");
        Ok(IngestReport {
            document_id,
            filename: metadata.filename,
            title: metadata.title,
            author: metadata.author,
            num_pages: pages.len(),
            num_chunks: chunks.len(),
        })
    }

    /// Embeds all texts in configured batches, sequentially, preserving input
    /// order. Order is load-bearing: ids derive from `chunk_index`, so the
    /// i-th embedding must belong to the i-th chunk.
    async fn embed_all(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            let result = tokio::time::timeout(
                self.provider_timeout,
                self.embedder.embed_batch(batch),
            )
            .await
            .map_err(|_| {
                RagError::Provider(format!(
                    "embedding request timed out after {:?}",
                    self.provider_timeout
                ))
            })??;
            if result.len() != batch.len() {
                return Err(RagError::Provider(format!(
                    "provider returned {} embeddings for {} inputs",
                    result.len(),
                    batch.len()
                )));
            }
            embeddings.extend(result);
        }
        Ok(embeddings)
    }
}

fn fresh_document_id() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("doc-{}", &hex[..12])
}
