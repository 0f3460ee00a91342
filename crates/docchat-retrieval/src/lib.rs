//! docchat retrieval - ingestion and question-answering pipelines
//!
//! `IngestPipeline` turns a document into vectors in the collection;
//! `RagPipeline` answers a question from the chunks closest to it.

pub mod ingest;
pub mod models;
pub mod prompt;
pub mod rag;

pub use ingest::{
    prepare_document, prepare_pages, IngestPhase, IngestPipeline, IngestProgress, PreparedDocument,
};
pub use models::{IngestReport, QueryResult, SourceReference};
pub use rag::RagPipeline;
