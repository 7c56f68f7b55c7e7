//! In-memory vector storage for chunk embeddings.
//!
//! ```text
//!                  ┌──────────────────────┐
//!                  │  MemoryVectorStore   │
//!                  │  ids / texts /       │
//!                  │  embeddings / meta   │
//!                  │  (one RwLock)        │
//!                  └──────────┬───────────┘
//!                             │
//!              ┌──────────────┼──────────────┐
//!              ▼              ▼              ▼
//!        add_documents      query      delete_document
//!        (writers           (readers,  (writer,
//!         serialized)       snapshot)   atomic)
//! ```
//!
//! The store keeps four parallel sequences — ids, texts, embeddings, metadata
//! maps — logically one relation keyed by position. Retrieval is exact
//! brute-force cosine search; there is no persistence and no approximate
//! indexing.

pub mod memory;

use serde::{Deserialize, Serialize};

pub use memory::MemoryVectorStore;

/// Per-record metadata. Keys are compared with exact equality by query
/// filters, so the representation stays a plain JSON map.
pub type MetadataMap = serde_json::Map<String, serde_json::Value>;

/// One ranked result returned by [`MemoryVectorStore::query`].
///
/// Matches are snapshots: the store retains exclusive ownership of its
/// records, and mutating a returned match has no effect on stored data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryMatch {
    pub id: String,
    pub text: String,
    pub metadata: MetadataMap,
    /// Cosine distance, `1 - similarity`. Lower is more relevant; NaN
    /// (zero-magnitude vectors) ranks last.
    pub distance: f32,
}

/// Summary of one ingested document, derived from its stored chunks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub document_id: String,
    pub filename: Option<String>,
    pub num_pages: Option<u64>,
    pub num_chunks: usize,
}
