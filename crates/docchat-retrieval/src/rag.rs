use docchat_core::error::{DocchatError, Result};
use docchat_llm::ports::{Embedder, Generator};
use docchat_store::ports::VectorStore;
use std::sync::Arc;

use crate::models::{QueryResult, SourceReference};
use crate::prompt::render_qa_prompt;

/// Retrieval-augmented question answering over one collection
#[derive(Clone)]
pub struct RagPipeline {
    vector_store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn Generator>,
    top_k: usize,
}

impl RagPipeline {
    pub fn new(
        vector_store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
        top_k: usize,
    ) -> Self {
        Self { vector_store, embedder, generator, top_k }
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Answer a question from the closest chunks in the collection
    pub async fn answer(&self, query: &str) -> Result<QueryResult> {
        let sources = self.retrieve(query).await?;

        let prompt = render_qa_prompt(query, &sources);
        let answer = self.generator.generate(&prompt).await?;

        tracing::info!(
            sources = sources.len(),
            model = self.generator.model_name(),
            "Generated answer"
        );

        Ok(QueryResult { answer, sources })
    }

    /// Embed the query and fetch the top-k chunks.
    ///
    /// An empty or missing collection yields `NoContext`.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<SourceReference>> {
        let collection = self.vector_store.collection_name().to_string();
        let vector = self.embedder.embed_query(query).await?;

        let hits = match self.vector_store.search(&vector, self.top_k).await {
            Ok(hits) => hits,
            Err(DocchatError::CollectionNotFound { .. }) => {
                return Err(DocchatError::NoContext { collection })
            }
            Err(e) => return Err(e),
        };

        if hits.is_empty() {
            return Err(DocchatError::NoContext { collection });
        }

        tracing::debug!(hits = hits.len(), top_k = self.top_k, "Retrieved chunks");

        Ok(hits.into_iter().map(SourceReference::from).collect())
    }
}
