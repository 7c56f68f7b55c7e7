//! ```text
//! Extracted pages ──► chunking::TextChunker ──► Vec<Chunk>
//!                                  │
//!                                  ▼
//!              embeddings::EmbeddingProvider (batched)
//!                                  │
//!                                  ▼
//!            stores::MemoryVectorStore.add_documents
//!
//! Question ──► embeddings ──► stores::MemoryVectorStore.query
//!                                  │
//!                                  ▼
//!             ranked chunks ──► generation::GenerationProvider
//!                                  │
//!                                  ▼
//!                       AnswerOutcome (answer + citations)
//! ```
//!
//! Retrieval core for PDF question answering: overlapping chunk segmentation
//! with position tracking, an exact in-memory cosine store with filtered
//! deletion, and the orchestration that keeps chunk, embedding, and metadata
//! sequences consistent under concurrent ingestion and query traffic.
//!
//! HTTP routing, upload handling, and PDF text extraction are collaborators
//! that sit in front of [`engine::RagEngine`]; the LLM endpoints sit behind
//! the [`embeddings::EmbeddingProvider`] and [`generation::GenerationProvider`]
//! seams.

pub mod chunking;
pub mod config;
pub mod embeddings;
pub mod engine;
pub mod generation;
pub mod pipeline;
pub mod stores;
pub mod types;

pub use chunking::{Chunk, PageText, TextChunker};
pub use config::{ChunkerConfig, EngineConfig};
pub use engine::RagEngine;
pub use pipeline::{AnswerOutcome, DocumentMetadata, IngestReport, SourceChunk};
pub use stores::{DocumentInfo, MemoryVectorStore, QueryMatch};
pub use types::RagError;
