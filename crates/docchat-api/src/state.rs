use docchat_llm::ports::{Embedder, Generator};
use docchat_retrieval::RagPipeline;
use docchat_store::ports::VectorStore;
use std::sync::Arc;

/// Read-only handles shared by every request
#[derive(Clone)]
pub struct AppState {
    pub pipeline: RagPipeline,
}

impl AppState {
    pub fn new(
        vector_store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
        top_k: usize,
    ) -> Self {
        Self { pipeline: RagPipeline::new(vector_store, embedder, generator, top_k) }
    }
}
