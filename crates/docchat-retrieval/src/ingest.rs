use docchat_core::error::{DocchatError, Result};
use docchat_core::formats::reader_for_path;
use docchat_core::models::{DocumentPage, EmbeddedChunk, TextChunk};
use docchat_core::processing::{chunk_pages, ChunkConfig};
use docchat_llm::ports::Embedder;
use docchat_store::ports::VectorStore;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::models::IngestReport;

/// Progress information for ingestion
#[derive(Debug, Clone)]
pub struct IngestProgress {
    pub phase: IngestPhase,
    pub current: usize,
    pub total: usize,
    pub message: String,
}

/// Current phase of ingestion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestPhase {
    LoadingDocument,
    Chunking,
    PreparingCollection,
    Embedding,
    Finalizing,
}

/// A document that has been loaded and chunked but not yet embedded
#[derive(Debug, Clone)]
pub struct PreparedDocument {
    pub document_path: String,
    pub pages: usize,
    pub chunks: Vec<TextChunk>,
}

/// Load and chunk a document. Nothing here needs the vector store, so a bad
/// document is reported before any connection is made.
pub async fn prepare_document<F>(
    path: &Path,
    chunk_config: &ChunkConfig,
    progress: &mut F,
) -> Result<PreparedDocument>
where
    F: FnMut(IngestProgress),
{
    progress(IngestProgress {
        phase: IngestPhase::LoadingDocument,
        current: 0,
        total: 1,
        message: format!("Loading {}", path.display()),
    });

    let reader = reader_for_path(path)?;
    let pages = reader.read(path).await?;
    tracing::info!(path = %path.display(), pages = pages.len(), "Loaded document");

    let mut document = prepare_pages(&pages, chunk_config, progress)?;
    document.document_path = path.display().to_string();
    Ok(document)
}

/// Chunk already-loaded pages, failing on a document with no text
pub fn prepare_pages<F>(
    pages: &[DocumentPage],
    chunk_config: &ChunkConfig,
    progress: &mut F,
) -> Result<PreparedDocument>
where
    F: FnMut(IngestProgress),
{
    let document_path = pages.first().map(|p| p.document_path.clone()).unwrap_or_default();

    progress(IngestProgress {
        phase: IngestPhase::Chunking,
        current: 0,
        total: pages.len(),
        message: "Chunking pages".to_string(),
    });

    let chunks = chunk_pages(pages, chunk_config)?;
    if chunks.is_empty() {
        return Err(DocchatError::EmptyDocument { path: PathBuf::from(&document_path) });
    }
    tracing::info!(chunks = chunks.len(), "Chunked document");

    Ok(PreparedDocument { document_path, pages: pages.len(), chunks })
}

/// Document ingestion: load, chunk, embed and insert into the collection
pub struct IngestPipeline {
    vector_store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    chunk_config: ChunkConfig,
    batch_size: usize,
    recreate: bool,
}

impl IngestPipeline {
    pub fn new(
        vector_store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        chunk_config: ChunkConfig,
    ) -> Self {
        Self { vector_store, embedder, chunk_config, batch_size: 100, recreate: false }
    }

    /// Set the number of chunks embedded and inserted per request
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Drop an existing collection before ingesting
    pub fn with_recreate(mut self, recreate: bool) -> Self {
        self.recreate = recreate;
        self
    }

    pub async fn run(&self, path: &Path) -> Result<IngestReport> {
        self.run_with_progress(path, |_| {}).await
    }

    /// Ingest a document with progress reporting
    pub async fn run_with_progress<F>(&self, path: &Path, mut progress: F) -> Result<IngestReport>
    where
        F: FnMut(IngestProgress),
    {
        let document = prepare_document(path, &self.chunk_config, &mut progress).await?;
        self.ingest_prepared_with_progress(document, progress).await
    }

    /// Chunk, embed and insert already-loaded pages
    pub async fn ingest_pages_with_progress<F>(
        &self,
        pages: &[DocumentPage],
        mut progress: F,
    ) -> Result<IngestReport>
    where
        F: FnMut(IngestProgress),
    {
        let document = prepare_pages(pages, &self.chunk_config, &mut progress)?;
        self.ingest_prepared_with_progress(document, progress).await
    }

    /// Embed and insert a prepared document. This is the first step that
    /// touches the vector store.
    pub async fn ingest_prepared_with_progress<F>(
        &self,
        document: PreparedDocument,
        mut progress: F,
    ) -> Result<IngestReport>
    where
        F: FnMut(IngestProgress),
    {
        let collection = self.vector_store.collection_name().to_string();
        let chunks = document.chunks;
        let mut report = IngestReport {
            document_path: document.document_path,
            collection: collection.clone(),
            pages: document.pages,
            chunks: chunks.len(),
            ..Default::default()
        };

        progress(IngestProgress {
            phase: IngestPhase::PreparingCollection,
            current: 0,
            total: 1,
            message: format!("Preparing collection '{}'", collection),
        });

        let (created, recreated) = self.prepare_collection().await?;
        report.collection_created = created;
        report.recreated = recreated;

        let total = chunks.len();
        for batch in chunks.chunks(self.batch_size) {
            progress(IngestProgress {
                phase: IngestPhase::Embedding,
                current: report.inserted,
                total,
                message: "Embedding chunks".to_string(),
            });

            let texts: Vec<&str> = batch.iter().map(|c| c.content.as_str()).collect();
            let vectors = self.embedder.embed_documents(&texts).await?;

            let rows: Vec<EmbeddedChunk> = batch
                .iter()
                .cloned()
                .zip(vectors)
                .map(|(chunk, vector)| EmbeddedChunk::new(chunk, vector))
                .collect();

            report.inserted += self.vector_store.insert(&rows).await?;
        }

        progress(IngestProgress {
            phase: IngestPhase::Finalizing,
            current: report.inserted,
            total,
            message: "Ingestion complete".to_string(),
        });

        tracing::info!(
            pages = report.pages,
            chunks = report.chunks,
            inserted = report.inserted,
            collection = %collection,
            "Ingestion Complete"
        );

        Ok(report)
    }

    /// Returns (created, recreated)
    async fn prepare_collection(&self) -> Result<(bool, bool)> {
        let name = self.vector_store.collection_name();
        let mut exists = self.vector_store.has_collection().await?;
        let mut recreated = false;

        if exists && self.recreate {
            tracing::warn!(collection = %name, "Dropping existing collection");
            self.vector_store.drop_collection().await?;
            exists = false;
            recreated = true;
        }

        if exists {
            tracing::info!(collection = %name, "Using existing collection");
            return Ok((false, recreated));
        }

        tracing::info!(collection = %name, "Collection does not exist. It will be created");
        self.vector_store.create_collection(self.embedder.dimensions()).await?;
        Ok((true, recreated))
    }
}
