//! Ingestion and retrieval orchestration over the chunker, the provider
//! seams, and the vector store.

pub mod ingestion;
pub mod retrieval;

pub use ingestion::{DocumentMetadata, IngestReport, IngestionPipeline};
pub use retrieval::{AnswerOutcome, NO_CONTEXT_ANSWER, RetrievalPipeline, SourceChunk};
