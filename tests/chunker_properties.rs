//! Property tests for the chunker's size and ordering guarantees.

use proptest::prelude::*;

use ragforge::chunking::{PageText, TextChunker};
use ragforge::config::ChunkerConfig;

fn chunker(chunk_size: usize, chunk_overlap: usize) -> TextChunker {
    TextChunker::new(ChunkerConfig {
        chunk_size,
        chunk_overlap,
    })
    .unwrap()
}

/// Longest run of non-separator characters in the input; the only fragments
/// allowed to exceed the configured chunk size.
fn longest_indivisible_token(text: &str) -> usize {
    text.split(|c: char| c == ' ' || c == '\n')
        .map(|token| token.chars().count())
        .max()
        .unwrap_or(0)
}

proptest! {
    #[test]
    fn chunks_respect_size_except_indivisible_tokens(
        text in "[a-z .\n]{0,400}",
        chunk_size in 2usize..60,
        overlap_frac in 1usize..100,
    ) {
        let chunk_overlap = (chunk_size * overlap_frac / 200).max(1);
        prop_assume!(chunk_overlap < chunk_size);

        let chunker = chunker(chunk_size, chunk_overlap);
        let longest_token = longest_indivisible_token(&text);

        for chunk in chunker.chunk_text(&text) {
            prop_assert!(
                chunk.length <= chunk_size || chunk.length <= longest_token,
                "chunk of length {} exceeds size {} and longest token {}",
                chunk.length,
                chunk_size,
                longest_token
            );
        }
    }

    #[test]
    fn chunk_indices_strictly_increase_across_pages(
        page_a in "[a-z ]{0,200}",
        page_b in "[a-z ]{0,200}",
        chunk_size in 5usize..40,
    ) {
        let chunker = chunker(chunk_size, chunk_size / 2 + 1);

        let pages = vec![PageText::new(1, page_a), PageText::new(2, page_b)];
        let chunks = chunker.chunk_pages(&pages);

        for (i, chunk) in chunks.iter().enumerate() {
            prop_assert_eq!(chunk.chunk_index, i);
        }
    }

    #[test]
    fn no_chunk_is_whitespace_only(
        text in "[a-z \n]{0,300}",
        chunk_size in 3usize..50,
    ) {
        let chunker = chunker(chunk_size, 1);
        for chunk in chunker.chunk_text(&text) {
            prop_assert!(!chunk.text.trim().is_empty());
        }
    }
}
