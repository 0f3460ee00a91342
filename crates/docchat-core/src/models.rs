pub mod document;
pub mod query;

pub use document::{ChunkId, ChunkMetadata, ChunkSource, DocumentPage, EmbeddedChunk, TextChunk};
pub use query::ScoredChunk;
