//! In-memory vector store for development and testing.
//!
//! Mirrors the behaviour the query and ingestion paths rely on from Milvus:
//! operations on a missing collection fail, inserts with the wrong
//! dimensionality are rejected, and inserts always append.

use async_trait::async_trait;
use docchat_core::error::{DocchatError, Result};
use docchat_core::models::{EmbeddedChunk, ScoredChunk};
use std::sync::{Arc, PoisonError, RwLock};

use crate::ports::VectorStore;

#[derive(Debug, Clone)]
struct MemoryCollection {
    dimensions: usize,
    rows: Vec<EmbeddedChunk>,
}

/// In-memory implementation of VectorStore, scored by inner product
#[derive(Debug, Clone)]
pub struct MemoryVectorStore {
    name: String,
    collection: Arc<RwLock<Option<MemoryCollection>>>,
}

impl MemoryVectorStore {
    /// Create a handle for a collection that does not exist yet
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), collection: Arc::new(RwLock::new(None)) }
    }

    fn not_found(&self) -> DocchatError {
        DocchatError::CollectionNotFound { name: self.name.clone() }
    }
}

fn poisoned<T>(_: PoisonError<T>) -> DocchatError {
    DocchatError::VectorStore("in-memory collection lock poisoned".to_string())
}

fn inner_product(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    fn collection_name(&self) -> &str {
        &self.name
    }

    async fn has_collection(&self) -> Result<bool> {
        Ok(self.collection.read().map_err(poisoned)?.is_some())
    }

    async fn create_collection(&self, dimensions: usize) -> Result<()> {
        let mut collection = self.collection.write().map_err(poisoned)?;
        if collection.is_some() {
            return Err(DocchatError::VectorStore(format!(
                "collection '{}' already exists",
                self.name
            )));
        }
        *collection = Some(MemoryCollection { dimensions, rows: Vec::new() });
        Ok(())
    }

    async fn drop_collection(&self) -> Result<()> {
        *self.collection.write().map_err(poisoned)? = None;
        Ok(())
    }

    async fn insert(&self, chunks: &[EmbeddedChunk]) -> Result<usize> {
        let mut guard = self.collection.write().map_err(poisoned)?;
        let collection = guard.as_mut().ok_or_else(|| self.not_found())?;

        if let Some(bad) = chunks.iter().find(|c| c.dimensions() != collection.dimensions) {
            return Err(DocchatError::DimensionMismatch {
                expected: collection.dimensions,
                actual: bad.dimensions(),
            });
        }

        collection.rows.extend_from_slice(chunks);
        Ok(chunks.len())
    }

    async fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<ScoredChunk>> {
        let guard = self.collection.read().map_err(poisoned)?;
        let collection = guard.as_ref().ok_or_else(|| self.not_found())?;

        if query.len() != collection.dimensions {
            return Err(DocchatError::DimensionMismatch {
                expected: collection.dimensions,
                actual: query.len(),
            });
        }

        let mut scored: Vec<ScoredChunk> = collection
            .rows
            .iter()
            .map(|row| ScoredChunk {
                chunk_id: row.chunk.id,
                score: inner_product(query, &row.vector),
                content: row.chunk.content.clone(),
                source: row.chunk.source.clone(),
            })
            .collect();

        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(top_k);
        Ok(scored)
    }

    async fn row_count(&self) -> Result<usize> {
        let guard = self.collection.read().map_err(poisoned)?;
        let collection = guard.as_ref().ok_or_else(|| self.not_found())?;
        Ok(collection.rows.len())
    }
}
