//! Concurrency tests for the vector store: writers serialized, readers never
//! observing a partially-applied write.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use ragforge::chunking::Chunk;
use ragforge::stores::MemoryVectorStore;

const CHUNKS_PER_DOC: usize = 4;

fn doc_chunks() -> Vec<Chunk> {
    (0..CHUNKS_PER_DOC)
        .map(|i| Chunk {
            text: format!("chunk {i}"),
            page_number: Some(1),
            chunk_index: i,
            local_chunk_index: Some(i),
            length: 7,
        })
        .collect()
}

fn doc_embeddings() -> Vec<Vec<f32>> {
    (0..CHUNKS_PER_DOC)
        .map(|i| vec![i as f32 + 1.0, 1.0])
        .collect()
}

#[test]
fn readers_only_see_whole_documents() {
    let store = Arc::new(MemoryVectorStore::new());
    let done = Arc::new(AtomicBool::new(false));

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let store = Arc::clone(&store);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                while !done.load(Ordering::Relaxed) {
                    // Inserts and deletes are whole-document, so any observed
                    // count must be a multiple of the per-document chunk count.
                    let count = store.document_count();
                    assert_eq!(count % CHUNKS_PER_DOC, 0, "partial document visible");

                    let matches = store.query(&[1.0, 1.0], 64, None).unwrap();
                    assert_eq!(matches.len() % CHUNKS_PER_DOC, 0);
                }
            })
        })
        .collect();

    let writers: Vec<_> = (0..4)
        .map(|w| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..25 {
                    let document_id = format!("doc-w{w}-{i}");
                    store
                        .add_documents(&doc_chunks(), &doc_embeddings(), &document_id, None)
                        .unwrap();
                    if i % 3 == 0 {
                        assert_eq!(store.delete_document(&document_id), CHUNKS_PER_DOC);
                    }
                }
            })
        })
        .collect();

    for writer in writers {
        writer.join().unwrap();
    }
    done.store(true, Ordering::Relaxed);
    for reader in readers {
        reader.join().unwrap();
    }

    // 4 writers × 25 docs, every third deleted again.
    let deleted_per_writer = 9; // i = 0, 3, ..., 24
    let expected_docs = 4 * (25 - deleted_per_writer);
    assert_eq!(store.document_count(), expected_docs * CHUNKS_PER_DOC);
    assert_eq!(store.list_documents().len(), expected_docs);
}
