//! Exact brute-force cosine store over parallel in-memory arrays.

use std::collections::HashSet;

use parking_lot::RwLock;

use crate::chunking::Chunk;
use crate::types::RagError;

use super::{DocumentInfo, MetadataMap, QueryMatch};

/// In-memory vector store.
///
/// State is four parallel sequences of equal length guarded by a single
/// [`RwLock`]: writers (`add_documents`, `delete_document`) are fully
/// serialized, readers observe a consistent snapshot and never see a
/// partially-applied write. The store owns its records exclusively; queries
/// return copies.
///
/// The embedding dimension is fixed by the first inserted vector and kept for
/// the lifetime of the store instance, including across deletion of every
/// record.
#[derive(Debug, Default)]
pub struct MemoryVectorStore {
    inner: RwLock<StoreInner>,
}

#[derive(Debug, Default)]
struct StoreInner {
    ids: Vec<String>,
    texts: Vec<String>,
    embeddings: Vec<Vec<f32>>,
    metadatas: Vec<MetadataMap>,
    dimension: Option<usize>,
}

impl MemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Embedding dimension accepted by this store, once fixed.
    pub fn dimension(&self) -> Option<usize> {
        self.inner.read().dimension
    }

    /// Appends one document's chunks with their embeddings.
    ///
    /// Ids are synthesized as `"{document_id}_chunk_{chunk_index}"`.
    /// `extra_metadata` pairs (filename, page count) are merged into each
    /// record's metadata. All validation runs before the first append, so a
    /// failed call leaves the store unchanged. Existing positions are never
    /// rewritten; re-ingestion under a fresh document id is append-only.
    pub fn add_documents(
        &self,
        chunks: &[Chunk],
        embeddings: &[Vec<f32>],
        document_id: &str,
        extra_metadata: Option<&MetadataMap>,
    ) -> Result<(), RagError> {
        if chunks.len() != embeddings.len() {
            return Err(RagError::DimensionMismatch(format!(
                "{} chunks but {} embeddings",
                chunks.len(),
                embeddings.len()
            )));
        }
        if chunks.is_empty() {
            return Ok(());
        }

        let mut inner = self.inner.write();

        let dimension = inner.dimension.unwrap_or(embeddings[0].len());
        for embedding in embeddings {
            if embedding.len() != dimension {
                return Err(RagError::DimensionMismatch(format!(
                    "embedding of length {} does not match store dimension {}",
                    embedding.len(),
                    dimension
                )));
            }
        }

        let existing: HashSet<&str> = inner.ids.iter().map(String::as_str).collect();
        let mut batch_ids = Vec::with_capacity(chunks.len());
        let mut batch_seen = HashSet::new();
        for chunk in chunks {
            let id = format!("{document_id}_chunk_{}", chunk.chunk_index);
            if existing.contains(id.as_str()) || !batch_seen.insert(id.clone()) {
                return Err(RagError::DuplicateId(id));
            }
            batch_ids.push(id);
        }

        for ((chunk, embedding), id) in chunks.iter().zip(embeddings).zip(batch_ids) {
            let mut metadata = MetadataMap::new();
            metadata.insert("document_id".to_string(), document_id.into());
            metadata.insert(
                "page_number".to_string(),
                chunk.page_number.unwrap_or(0).into(),
            );
            metadata.insert("chunk_index".to_string(), chunk.chunk_index.into());
            metadata.insert("chunk_length".to_string(), chunk.length.into());
            if let Some(extra) = extra_metadata {
                for (key, value) in extra {
                    metadata.insert(key.clone(), value.clone());
                }
            }

            inner.ids.push(id);
            inner.texts.push(chunk.text.clone());
            inner.embeddings.push(embedding.clone());
            inner.metadatas.push(metadata);
        }
        inner.dimension = Some(dimension);

        tracing::info!(
            chunks = chunks.len(),
            document_id,
            "added chunks to vector store"
        );
        Ok(())
    }

    /// Exact cosine similarity search.
    ///
    /// With a `filter`, a record survives only when every `(key, value)` pair
    /// matches its metadata exactly; filtering preserves stored order before
    /// scoring. Results are sorted ascending by distance with a stable sort,
    /// so ties keep insertion order and repeated queries over an unchanged
    /// store are deterministic. NaN distances (zero-magnitude vectors) rank
    /// last. An empty store yields an empty result.
    pub fn query(
        &self,
        query_embedding: &[f32],
        n_results: usize,
        filter: Option<&MetadataMap>,
    ) -> Result<Vec<QueryMatch>, RagError> {
        let inner = self.inner.read();
        if inner.ids.is_empty() {
            return Ok(Vec::new());
        }
        if let Some(dimension) = inner.dimension {
            if query_embedding.len() != dimension {
                return Err(RagError::DimensionMismatch(format!(
                    "query embedding of length {} does not match store dimension {dimension}",
                    query_embedding.len()
                )));
            }
        }

        let mut scored: Vec<(usize, f32)> = Vec::new();
        for (position, embedding) in inner.embeddings.iter().enumerate() {
            if let Some(filter) = filter {
                let metadata = &inner.metadatas[position];
                let matches = filter
                    .iter()
                    .all(|(key, value)| metadata.get(key) == Some(value));
                if !matches {
                    continue;
                }
            }
            let distance = 1.0 - cosine_similarity(query_embedding, embedding);
            scored.push((position, distance));
        }

        scored.sort_by(|(_, a), (_, b)| match (a.is_nan(), b.is_nan()) {
            (true, true) => std::cmp::Ordering::Equal,
            (true, false) => std::cmp::Ordering::Greater,
            (false, true) => std::cmp::Ordering::Less,
            (false, false) => a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal),
        });
        scored.truncate(n_results);

        Ok(scored
            .into_iter()
            .map(|(position, distance)| QueryMatch {
                id: inner.ids[position].clone(),
                text: inner.texts[position].clone(),
                metadata: inner.metadatas[position].clone(),
                distance,
            })
            .collect())
    }

    /// Removes every record owned by `document_id`, atomically with respect
    /// to concurrent queries. Returns the number removed; an unknown id
    /// removes nothing and is not an error.
    pub fn delete_document(&self, document_id: &str) -> usize {
        let mut inner = self.inner.write();
        let keep: Vec<bool> = inner
            .metadatas
            .iter()
            .map(|metadata| {
                metadata.get("document_id").and_then(|v| v.as_str()) != Some(document_id)
            })
            .collect();
        let removed = keep.iter().filter(|&&k| !k).count();
        if removed == 0 {
            return 0;
        }

        let mut keep_ids = keep.iter();
        inner.ids.retain(|_| *keep_ids.next().expect("mask covers ids"));
        let mut keep_texts = keep.iter();
        inner
            .texts
            .retain(|_| *keep_texts.next().expect("mask covers texts"));
        let mut keep_embeddings = keep.iter();
        inner
            .embeddings
            .retain(|_| *keep_embeddings.next().expect("mask covers embeddings"));
        let mut keep_metadatas = keep.iter();
        inner
            .metadatas
            .retain(|_| *keep_metadatas.next().expect("mask covers metadatas"));

        tracing::info!(removed, document_id, "deleted document chunks");
        removed
    }

    /// Total record count across all documents.
    pub fn document_count(&self) -> usize {
        self.inner.read().ids.len()
    }

    /// Every distinct document id currently present, sorted.
    pub fn list_documents(&self) -> Vec<String> {
        let inner = self.inner.read();
        let mut ids: Vec<String> = inner
            .metadatas
            .iter()
            .filter_map(|metadata| metadata.get("document_id").and_then(|v| v.as_str()))
            .map(str::to_string)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        ids.sort();
        ids
    }

    /// Summary for one document, from its stored chunk metadata.
    pub fn document_info(&self, document_id: &str) -> Result<DocumentInfo, RagError> {
        let inner = self.inner.read();
        let mut num_chunks = 0usize;
        let mut filename = None;
        let mut num_pages = None;
        for metadata in &inner.metadatas {
            if metadata.get("document_id").and_then(|v| v.as_str()) != Some(document_id) {
                continue;
            }
            num_chunks += 1;
            if filename.is_none() {
                filename = metadata
                    .get("filename")
                    .and_then(|v| v.as_str())
                    .map(str::to_string);
            }
            if num_pages.is_none() {
                num_pages = metadata.get("num_pages").and_then(|v| v.as_u64());
            }
        }
        if num_chunks == 0 {
            return Err(RagError::NotFound(document_id.to_string()));
        }
        Ok(DocumentInfo {
            document_id: document_id.to_string(),
            filename,
            num_pages,
            num_chunks,
        })
    }
}

/// `dot(a, b) / (‖a‖ * ‖b‖)`; NaN when either vector has zero magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|y| y * y).sum::<f32>().sqrt();
    dot / (norm_a * norm_b)
}
