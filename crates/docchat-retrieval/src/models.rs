use docchat_core::models::{ChunkId, ScoredChunk};
use serde::{Deserialize, Serialize};

/// Summary of one ingestion run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    /// Source document
    pub document_path: String,

    /// Collection the vectors were written to
    pub collection: String,

    /// Pages with extractable text
    pub pages: usize,

    /// Chunks produced by the chunker
    pub chunks: usize,

    /// Rows the vector database acknowledged
    pub inserted: usize,

    /// Whether the collection had to be created for this run
    pub collection_created: bool,

    /// Whether an existing collection was dropped first
    pub recreated: bool,
}

/// Answer produced by the question-answering pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    /// The generated answer
    pub answer: String,

    /// Chunks used to ground the answer, best match first
    pub sources: Vec<SourceReference>,
}

/// Retrieved chunk reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceReference {
    pub chunk_id: ChunkId,

    /// Source document path
    pub document_path: String,

    /// Optional page number
    pub page: Option<usize>,

    /// Text excerpt
    pub excerpt: String,

    /// Relevance score
    pub score: f32,
}

impl From<ScoredChunk> for SourceReference {
    fn from(hit: ScoredChunk) -> Self {
        Self {
            chunk_id: hit.chunk_id,
            document_path: hit.source.document_path,
            page: hit.source.page,
            excerpt: hit.content,
            score: hit.score,
        }
    }
}
