use async_trait::async_trait;
use docchat_core::error::Result;
use docchat_core::models::{EmbeddedChunk, ScoredChunk};

/// Port for a single named collection in a vector database
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Name of the collection this handle operates on
    fn collection_name(&self) -> &str;

    /// Whether the collection exists
    async fn has_collection(&self) -> Result<bool>;

    /// Create the collection with the given embedding dimension
    async fn create_collection(&self, dimensions: usize) -> Result<()>;

    /// Drop the collection and all of its vectors
    async fn drop_collection(&self) -> Result<()>;

    /// Insert embedded chunks, returning the number of rows written.
    /// Existing rows are never replaced.
    async fn insert(&self, chunks: &[EmbeddedChunk]) -> Result<usize>;

    /// Return up to `top_k` chunks most similar to `query`, best first
    async fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<ScoredChunk>>;

    /// Number of rows stored in the collection
    async fn row_count(&self) -> Result<usize>;
}
