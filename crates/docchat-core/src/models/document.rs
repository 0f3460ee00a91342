use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a text chunk, used as the vector database primary key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkId(pub Uuid);

impl ChunkId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ChunkId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One page of text loaded from a source document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentPage {
    /// Source document path
    pub document_path: String,

    /// 1-based page number
    pub page: usize,

    /// Extracted text
    pub text: String,
}

/// Text chunk extracted from a document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextChunk {
    /// Unique identifier
    pub id: ChunkId,

    /// Text content
    pub content: String,

    /// Source information
    pub source: ChunkSource,

    /// Additional metadata
    pub metadata: ChunkMetadata,
}

/// Source of a text chunk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkSource {
    /// Source document path
    pub document_path: String,

    /// Page number (for PDFs)
    pub page: Option<usize>,

    /// Byte offset of the chunk within the page text
    pub offset: usize,
}

/// Chunk metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Chunk size in characters
    pub size: usize,

    /// When the chunk was produced
    pub ingested_at: DateTime<Utc>,
}

/// A chunk paired with its embedding vector, ready for insertion
#[derive(Debug, Clone)]
pub struct EmbeddedChunk {
    pub chunk: TextChunk,
    pub vector: Vec<f32>,
}

impl EmbeddedChunk {
    pub fn new(chunk: TextChunk, vector: Vec<f32>) -> Self {
        Self { chunk, vector }
    }

    pub fn dimensions(&self) -> usize {
        self.vector.len()
    }
}
