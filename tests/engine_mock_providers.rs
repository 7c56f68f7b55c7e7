//! Integration tests for the full ingest → query → answer flow with mock
//! providers, suitable for CI and deterministic runs.

use std::sync::Arc;

use ragforge::chunking::PageText;
use ragforge::config::{ChunkerConfig, EngineConfig};
use ragforge::embeddings::MockEmbeddingProvider;
use ragforge::generation::MockGenerationProvider;
use ragforge::pipeline::{DocumentMetadata, NO_CONTEXT_ANSWER};
use ragforge::{RagEngine, RagError};

fn small_chunk_config() -> EngineConfig {
    EngineConfig {
        chunker: ChunkerConfig {
            chunk_size: 80,
            chunk_overlap: 20,
        },
        ..Default::default()
    }
}

fn make_engine(generator: Arc<MockGenerationProvider>) -> RagEngine {
    RagEngine::builder()
        .config(small_chunk_config())
        .embedder(Arc::new(MockEmbeddingProvider::new()))
        .generator(generator)
        .build()
        .unwrap()
}

fn sample_pages() -> Vec<PageText> {
    vec![
        PageText::new(
            1,
            "Machine learning is the study of algorithms that improve through \
             experience. Supervised learning fits models to labeled examples. \
             Unsupervised learning finds structure in unlabeled data.",
        ),
        PageText::new(
            2,
            "Retrieval-augmented generation first retrieves relevant passages \
             and then conditions text generation on them. It reduces \
             hallucination by grounding answers in stored documents.",
        ),
    ]
}

#[tokio::test]
async fn ingest_reports_pages_and_chunks() {
    let engine = make_engine(Arc::new(MockGenerationProvider::new()));

    let report = engine
        .ingest(&sample_pages(), DocumentMetadata::new("ml_notes.pdf"))
        .await
        .unwrap();

    assert!(report.document_id.starts_with("doc-"));
    assert_eq!(report.filename, "ml_notes.pdf");
    assert_eq!(report.num_pages, 2);
    assert!(report.num_chunks > 2);
    assert_eq!(engine.count(), report.num_chunks);
    assert_eq!(engine.list(), vec![report.document_id.clone()]);
}

#[tokio::test]
async fn reingesting_same_filename_yields_new_document() {
    let engine = make_engine(Arc::new(MockGenerationProvider::new()));
    let pages = sample_pages();
    let meta = DocumentMetadata::new("ml_notes.pdf");

    let first = engine.ingest(&pages, meta.clone()).await.unwrap();
    let second = engine.ingest(&pages, meta).await.unwrap();

    assert_ne!(first.document_id, second.document_id);
    assert_eq!(engine.count(), first.num_chunks + second.num_chunks);
    assert_eq!(engine.list().len(), 2);
}

#[tokio::test]
async fn delete_removes_exactly_one_document() {
    let engine = make_engine(Arc::new(MockGenerationProvider::new()));
    let first = engine
        .ingest(&sample_pages(), DocumentMetadata::new("a.pdf"))
        .await
        .unwrap();
    let second = engine
        .ingest(&sample_pages(), DocumentMetadata::new("b.pdf"))
        .await
        .unwrap();

    assert!(engine.delete(&first.document_id));
    assert_eq!(engine.count(), second.num_chunks);
    assert_eq!(engine.list(), vec![second.document_id.clone()]);

    // Idempotent: deleting again is a no-op, not an error.
    assert!(!engine.delete(&first.document_id));
}

#[tokio::test]
async fn answer_returns_ranked_sources_with_metadata() {
    let generator = Arc::new(MockGenerationProvider::new().with_answer("grounded answer"));
    let engine = make_engine(Arc::clone(&generator));
    let report = engine
        .ingest(&sample_pages(), DocumentMetadata::new("ml_notes.pdf"))
        .await
        .unwrap();

    let outcome = engine
        .answer("What is retrieval-augmented generation?", Some(3), None)
        .await
        .unwrap();

    assert_eq!(outcome.answer, "grounded answer");
    assert_eq!(outcome.model_used, "mock-generation");
    assert!(!outcome.sources.is_empty());
    assert!(outcome.sources.len() <= 3);
    assert_eq!(outcome.document_ids, vec![report.document_id]);
    assert_eq!(generator.calls(), 1);

    // Distances ascend through the ranked list.
    for pair in outcome.sources.windows(2) {
        assert!(pair[0].relevance_score <= pair[1].relevance_score);
    }
}

#[tokio::test]
async fn no_matching_sources_short_circuits_generation() {
    let generator = Arc::new(MockGenerationProvider::new());
    let engine = make_engine(Arc::clone(&generator));
    engine
        .ingest(&sample_pages(), DocumentMetadata::new("ml_notes.pdf"))
        .await
        .unwrap();

    let outcome = engine
        .answer("anything", Some(5), Some("doc-does-not-exist"))
        .await
        .unwrap();

    assert_eq!(outcome.answer, NO_CONTEXT_ANSWER);
    assert!(outcome.sources.is_empty());
    assert!(outcome.document_ids.is_empty());
    assert_eq!(outcome.model_used, "mock-generation");
    assert_eq!(outcome.tokens_used, None);
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn empty_store_answers_without_generation() {
    let generator = Arc::new(MockGenerationProvider::new());
    let engine = make_engine(Arc::clone(&generator));

    let outcome = engine.answer("anything", None, None).await.unwrap();

    assert_eq!(outcome.answer, NO_CONTEXT_ANSWER);
    assert!(outcome.sources.is_empty());
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn document_filter_restricts_sources() {
    let engine = make_engine(Arc::new(MockGenerationProvider::new()));
    let first = engine
        .ingest(&sample_pages(), DocumentMetadata::new("a.pdf"))
        .await
        .unwrap();
    engine
        .ingest(&sample_pages(), DocumentMetadata::new("b.pdf"))
        .await
        .unwrap();

    let outcome = engine
        .answer("supervised learning", Some(10), Some(&first.document_id))
        .await
        .unwrap();

    assert_eq!(outcome.document_ids, vec![first.document_id]);
}

#[tokio::test]
async fn source_previews_are_truncated_display_only() {
    let config = EngineConfig {
        chunker: ChunkerConfig {
            chunk_size: 400,
            chunk_overlap: 50,
        },
        source_preview_chars: 40,
        ..Default::default()
    };
    let engine = RagEngine::builder()
        .config(config)
        .embedder(Arc::new(MockEmbeddingProvider::new()))
        .generator(Arc::new(MockGenerationProvider::new()))
        .build()
        .unwrap();

    let long_sentence = "The corpus contains a single long passage that easily \
         exceeds the configured preview length for displayed sources.";
    engine
        .ingest(
            &[PageText::new(1, long_sentence)],
            DocumentMetadata::new("long.pdf"),
        )
        .await
        .unwrap();

    let outcome = engine.answer("passage", Some(1), None).await.unwrap();
    let source = &outcome.sources[0];
    assert!(source.text.ends_with("..."));
    assert_eq!(source.text.chars().count(), 40 + 3);
}

#[tokio::test]
async fn out_of_range_top_k_is_a_configuration_error() {
    let engine = make_engine(Arc::new(MockGenerationProvider::new()));
    let err = engine.answer("q", Some(0), None).await.unwrap_err();
    assert!(matches!(err, RagError::Configuration(_)));
    let err = engine.answer("q", Some(21), None).await.unwrap_err();
    assert!(matches!(err, RagError::Configuration(_)));
}

#[tokio::test]
async fn document_info_reflects_ingested_metadata() {
    let engine = make_engine(Arc::new(MockGenerationProvider::new()));
    let report = engine
        .ingest(&sample_pages(), DocumentMetadata::new("ml_notes.pdf"))
        .await
        .unwrap();

    let info = engine.document_info(&report.document_id).unwrap();
    assert_eq!(info.filename.as_deref(), Some("ml_notes.pdf"));
    assert_eq!(info.num_pages, Some(2));
    assert_eq!(info.num_chunks, report.num_chunks);

    assert!(matches!(
        engine.document_info("doc-missing"),
        Err(RagError::NotFound(_))
    ));
}

#[tokio::test]
async fn failing_embedder_leaves_store_unchanged() {
    use async_trait::async_trait;
    use ragforge::embeddings::EmbeddingProvider;

    struct FailingEmbedder;

    #[async_trait]
    impl EmbeddingProvider for FailingEmbedder {
        fn model_id(&self) -> &str {
            "failing"
        }

        async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
            Err(RagError::Provider("synthetic outage".to_string()))
        }
    }

    let engine = RagEngine::builder()
        .config(small_chunk_config())
        .embedder(Arc::new(FailingEmbedder))
        .generator(Arc::new(MockGenerationProvider::new()))
        .build()
        .unwrap();

    let err = engine
        .ingest(&sample_pages(), DocumentMetadata::new("doomed.pdf"))
        .await
        .unwrap_err();
    assert!(matches!(err, RagError::Provider(_)));
    assert_eq!(engine.count(), 0);
    assert!(engine.list().is_empty());
}
