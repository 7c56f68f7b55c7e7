//! Generation capability seam.
//!
//! Answer generation is a black box with one contract: question plus ranked
//! context in, text plus model id and token usage out. The backend is chosen
//! once at engine construction — [`openai::OpenAiGenerationProvider`] or
//! [`anthropic::AnthropicGenerationProvider`] — never re-checked per call.
//! Prompt assembly is shared by both HTTP backends so answers cite chunks the
//! same way regardless of provider.

pub mod anthropic;
pub mod openai;

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::RagError;

pub use anthropic::AnthropicGenerationProvider;
pub use openai::OpenAiGenerationProvider;

pub(crate) const SYSTEM_PROMPT: &str = "You are a helpful assistant that answers questions \
based on the provided context from PDF documents.\n\n\
Rules:\n\
1. Only use information from the provided context\n\
2. If the context doesn't contain enough information, say so\n\
3. Cite which chunk(s) you used (e.g., \"According to Chunk 2...\")\n\
4. Be concise and accurate\n\
5. If you're unsure, acknowledge it";

/// Result of one generation call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedAnswer {
    pub text: String,
    pub model: String,
    pub tokens_used: Option<u32>,
}

/// Question + ranked context → grounded answer.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Identifier of the underlying model, reported even when generation is
    /// skipped.
    fn model_id(&self) -> &str;

    /// Generates an answer grounded in `context`, which arrives in ranked
    /// retrieval order with full (untruncated) chunk texts.
    async fn generate(
        &self,
        question: &str,
        context: &[String],
    ) -> Result<GeneratedAnswer, RagError>;
}

/// Labels each context chunk and joins them for the prompt.
pub(crate) fn build_context(context: &[String]) -> String {
    context
        .iter()
        .enumerate()
        .map(|(i, chunk)| format!("[Chunk {}]\n{chunk}", i + 1))
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub(crate) fn build_user_prompt(question: &str, context: &[String]) -> String {
    format!(
        "Context from PDF:\n{}\n\nQuestion: {question}\n\n\
         Answer the question based on the context above. \
         Include citations to specific chunks.",
        build_context(context)
    )
}

/// Canned-answer provider for tests.
///
/// Counts invocations so tests can assert that the zero-source short-circuit
/// never reaches generation.
#[derive(Debug)]
pub struct MockGenerationProvider {
    answer: String,
    calls: AtomicUsize,
}

impl Default for MockGenerationProvider {
    fn default() -> Self {
        Self {
            answer: "mock answer".to_string(),
            calls: AtomicUsize::new(0),
        }
    }
}

impl MockGenerationProvider {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_answer(mut self, answer: impl Into<String>) -> Self {
        self.answer = answer.into();
        self
    }

    /// Number of `generate` calls observed so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerationProvider for MockGenerationProvider {
    fn model_id(&self) -> &str {
        "mock-generation"
    }

    async fn generate(
        &self,
        _question: &str,
        context: &[String],
    ) -> Result<GeneratedAnswer, RagError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(GeneratedAnswer {
            text: self.answer.clone(),
            model: self.model_id().to_string(),
            tokens_used: Some(context.len() as u32),
        })
    }
}
