//! Overlapping text chunking with page and ordering metadata.
//!
//! [`TextChunker`] splits page text into segments bounded by a configured
//! maximum length, recursively preferring paragraph boundaries, then line
//! breaks, then sentence boundaries, then whitespace. Consecutive segments
//! share a configured overlap so retrieval does not lose context at chunk
//! edges. All lengths are measured in Unicode scalar values.
//!
//! Chunking is a pure function of its input and configuration: no shared
//! state, no side effects beyond trace logging.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::config::ChunkerConfig;
use crate::types::RagError;

/// Separator priority for recursive splitting. The empty string is the
/// terminal fallback: a fragment containing none of the structural separators
/// is emitted whole, even when it exceeds the configured chunk size.
const SEPARATORS: [&str; 5] = ["\n\n", "\n", ". ", " ", ""];

/// One page of extracted document text, in reading order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageText {
    pub page_number: u32,
    pub text: String,
}

impl PageText {
    pub fn new(page_number: u32, text: impl Into<String>) -> Self {
        Self {
            page_number,
            text: text.into(),
        }
    }
}

/// A bounded segment of document text, the unit of embedding and retrieval.
///
/// `chunk_index` is global and strictly increasing across all pages of one
/// chunking call; `local_chunk_index` restarts at zero on each page. Both are
/// `None`-free for page-based chunking; [`TextChunker::chunk_text`] leaves
/// `page_number` and `local_chunk_index` unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub page_number: Option<u32>,
    pub chunk_index: usize,
    pub local_chunk_index: Option<usize>,
    /// Length of `text` in Unicode scalar values.
    pub length: usize,
}

/// Splits text into overlapping chunks.
#[derive(Debug, Clone)]
pub struct TextChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextChunker {
    /// Builds a chunker, validating the `0 < overlap < size` invariant.
    pub fn new(config: ChunkerConfig) -> Result<Self, RagError> {
        config.validate()?;
        Ok(Self {
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
        })
    }

    /// Chunks a sequence of pages, preserving input order.
    ///
    /// Empty and whitespace-only segments are dropped. The global
    /// `chunk_index` counter never resets between pages; ids derived from it
    /// stay unique per document.
    pub fn chunk_pages(&self, pages: &[PageText]) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        let mut global_index = 0usize;

        for page in pages {
            let mut local_index = 0usize;
            for text in self.split_text(&page.text) {
                if text.trim().is_empty() {
                    continue;
                }
                let length = text.chars().count();
                chunks.push(Chunk {
                    text,
                    page_number: Some(page.page_number),
                    chunk_index: global_index,
                    local_chunk_index: Some(local_index),
                    length,
                });
                global_index += 1;
                local_index += 1;
            }
        }

        tracing::info!(
            chunks = chunks.len(),
            pages = pages.len(),
            "created chunks from pages"
        );
        chunks
    }

    /// Chunks a full document when page numbers are unavailable.
    pub fn chunk_text(&self, text: &str) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        for segment in self.split_text(text) {
            if segment.trim().is_empty() {
                continue;
            }
            let length = segment.chars().count();
            chunks.push(Chunk {
                text: segment,
                page_number: None,
                chunk_index: chunks.len(),
                local_chunk_index: None,
                length,
            });
        }
        chunks
    }

    /// Splits raw text into segments no longer than `chunk_size`, except for
    /// indivisible fragments (no structural separator left), which are
    /// emitted as-is.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &SEPARATORS)
    }

    fn split_recursive(&self, text: &str, separators: &[&str]) -> Vec<String> {
        // Pick the first separator that occurs in the text; the empty string
        // always matches and terminates the recursion.
        let mut separator = *separators.last().unwrap_or(&"");
        let mut remaining: &[&str] = &[];
        for (i, &sep) in separators.iter().enumerate() {
            if sep.is_empty() || text.contains(sep) {
                separator = sep;
                remaining = &separators[i + 1..];
                break;
            }
        }

        if separator.is_empty() {
            // Indivisible fragment: emit whole, oversized or not.
            return vec![text.to_string()];
        }

        let splits: Vec<&str> = text.split(separator).filter(|s| !s.is_empty()).collect();

        let mut chunks = Vec::new();
        let mut pending: Vec<&str> = Vec::new();
        for split in splits {
            if split.chars().count() < self.chunk_size {
                pending.push(split);
                continue;
            }
            if !pending.is_empty() {
                chunks.extend(self.merge_splits(&pending, separator));
                pending.clear();
            }
            if remaining.is_empty() {
                chunks.push(split.to_string());
            } else {
                chunks.extend(self.split_recursive(split, remaining));
            }
        }
        if !pending.is_empty() {
            chunks.extend(self.merge_splits(&pending, separator));
        }
        chunks
    }

    /// Greedily packs splits into chunks up to `chunk_size`, then carries a
    /// `chunk_overlap`-sized tail of the previous window into the next one.
    fn merge_splits(&self, splits: &[&str], separator: &str) -> Vec<String> {
        let sep_len = separator.chars().count();
        let mut docs = Vec::new();
        let mut window: VecDeque<(&str, usize)> = VecDeque::new();
        let mut total = 0usize;

        for &split in splits {
            let len = split.chars().count();
            let joined = total + len + if window.is_empty() { 0 } else { sep_len };
            if joined > self.chunk_size {
                if total > self.chunk_size {
                    tracing::warn!(
                        total,
                        chunk_size = self.chunk_size,
                        "produced a chunk longer than the configured size"
                    );
                }
                if !window.is_empty() {
                    if let Some(doc) = join_window(&window, separator) {
                        docs.push(doc);
                    }
                    // Shrink the window until it fits the overlap budget and
                    // leaves room for the incoming split.
                    while total > self.chunk_overlap
                        || (total > 0
                            && total + len + if window.is_empty() { 0 } else { sep_len }
                                > self.chunk_size)
                    {
                        let (_, head_len) = window
                            .pop_front()
                            .expect("window is non-empty while total > 0");
                        total -= head_len + if window.is_empty() { 0 } else { sep_len };
                    }
                }
            }
            window.push_back((split, len));
            total += len + if window.len() > 1 { sep_len } else { 0 };
        }

        if let Some(doc) = join_window(&window, separator) {
            docs.push(doc);
        }
        docs
    }
}

fn join_window(window: &VecDeque<(&str, usize)>, separator: &str) -> Option<String> {
    let joined = window
        .iter()
        .map(|(s, _)| *s)
        .collect::<Vec<_>>()
        .join(separator);
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
