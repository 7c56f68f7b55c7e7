//! Embeds a question, retrieves ranked chunks, and hands them to generation.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::MAX_TOP_K;
use crate::embeddings::EmbeddingProvider;
use crate::generation::GenerationProvider;
use crate::stores::{MemoryVectorStore, MetadataMap, QueryMatch};
use crate::types::RagError;

/// Fixed answer returned when retrieval yields no sources. Generation is not
/// invoked in that case.
pub const NO_CONTEXT_ANSWER: &str =
    "I couldn't find any relevant information to answer your question.";

/// One cited source backing an answer. `text` is truncated for display; the
/// untruncated chunk text was sent to generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceChunk {
    pub text: String,
    pub page_number: u64,
    pub chunk_index: u64,
    /// Cosine distance rounded to three decimals; lower is more relevant.
    pub relevance_score: f32,
}

/// Complete answer with citations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerOutcome {
    pub answer: String,
    pub sources: Vec<SourceChunk>,
    /// Distinct document ids among the sources, in first-seen ranked order.
    pub document_ids: Vec<String>,
    pub model_used: String,
    pub tokens_used: Option<u32>,
}

/// Orchestrates question → retrieval → grounded generation.
pub struct RetrievalPipeline {
    embedder: Arc<dyn EmbeddingProvider>,
    generator: Arc<dyn GenerationProvider>,
    store: Arc<MemoryVectorStore>,
    preview_chars: usize,
    provider_timeout: Duration,
}

impl RetrievalPipeline {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        generator: Arc<dyn GenerationProvider>,
        store: Arc<MemoryVectorStore>,
        preview_chars: usize,
        provider_timeout: Duration,
    ) -> Self {
        Self {
            embedder,
            generator,
            store,
            preview_chars,
            provider_timeout,
        }
    }

    /// Answers `question` from the store, optionally restricted to one
    /// document.
    pub async fn answer(
        &self,
        question: &str,
        top_k: usize,
        document_id: Option<&str>,
    ) -> Result<AnswerOutcome, RagError> {
        if top_k == 0 || top_k > MAX_TOP_K {
            return Err(RagError::Configuration(format!(
                "top_k must be between 1 and {MAX_TOP_K}, got {top_k}"
            )));
        }
        tracing::info!(top_k, ?document_id, "processing query");

        let query_embedding = self.embed_question(question).await?;

        let filter = document_id.map(|id| {
            let mut map = MetadataMap::new();
            map.insert("document_id".to_string(), id.into());
            map
        });
        let matches = self
            .store
            .query(&query_embedding, top_k, filter.as_ref())?;

        if matches.is_empty() {
            tracing::warn!("no relevant chunks found");
            return Ok(AnswerOutcome {
                answer: NO_CONTEXT_ANSWER.to_string(),
                sources: Vec::new(),
                document_ids: Vec::new(),
                model_used: self.generator.model_id().to_string(),
                tokens_used: None,
            });
        }

        let context: Vec<String> = matches.iter().map(|m| m.text.clone()).collect();
        let generated = tokio::time::timeout(
            self.provider_timeout,
            self.generator.generate(question, &context),
        )
        .await
        .map_err(|_| {
            RagError::Provider(format!(
                "generation request timed out after {:?}",
                self.provider_timeout
            ))
        })??;

        let mut document_ids = Vec::new();
        let sources: Vec<SourceChunk> = matches
            .iter()
            .enumerate()
            .map(|(i, item)| {
                if let Some(id) = item.metadata.get("document_id").and_then(|v| v.as_str()) {
                    if !document_ids.iter().any(|known| known == id) {
                        document_ids.push(id.to_string());
                    }
                }
                self.to_source(item, i)
            })
            .collect();

        tracing::info!(sources = sources.len(), "generated answer");
        Ok(AnswerOutcome {
            answer: generated.text,
            sources,
            document_ids,
            model_used: generated.model,
            tokens_used: generated.tokens_used,
        })
    }

    async fn embed_question(&self, question: &str) -> Result<Vec<f32>, RagError> {
        let mut vectors = tokio::time::timeout(
            self.provider_timeout,
            self.embedder.embed_batch(&[question.to_string()]),
        )
        .await
        .map_err(|_| {
            RagError::Provider(format!(
                "embedding request timed out after {:?}",
                self.provider_timeout
            ))
        })??;
        if vectors.is_empty() {
            return Err(RagError::Provider(
                "provider returned no embedding for the question".to_string(),
            ));
        }
        Ok(vectors.swap_remove(0))
    }

    fn to_source(&self, item: &QueryMatch, position: usize) -> SourceChunk {
        let preview = truncate_chars(&item.text, self.preview_chars);
        SourceChunk {
            text: preview,
            page_number: item
                .metadata
                .get("page_number")
                .and_then(|v| v.as_u64())
                .unwrap_or(0),
            chunk_index: item
                .metadata
                .get("chunk_index")
                .and_then(|v| v.as_u64())
                .unwrap_or(position as u64),
            relevance_score: round3(item.distance),
        }
    }
}

/// Truncates display text at `limit` scalar values, appending a marker when
/// anything was cut.
fn truncate_chars(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(limit).collect();
    truncated.push_str("...");
    truncated
}

fn round3(value: f32) -> f32 {
    (value * 1000.0).round() / 1000.0
}
