use serde::{Deserialize, Serialize};

use super::{ChunkId, ChunkSource};

/// Retrieved chunk with its text and similarity score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk_id: ChunkId,

    /// Similarity score (higher is closer)
    pub score: f32,

    pub content: String,

    pub source: ChunkSource,
}
