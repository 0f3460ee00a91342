//! Error types for docchat

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocchatError {
    // Configuration errors
    #[error("Missing required configuration: {key}")]
    ConfigMissing { key: String },

    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // Document errors
    #[error("Document not found at {path}")]
    DocumentNotFound { path: PathBuf },

    #[error("Failed to extract {format} document: {reason}")]
    DocumentExtraction { format: String, reason: String },

    #[error("No text could be extracted from {path}")]
    EmptyDocument { path: PathBuf },

    // Model provider errors
    #[error("Embedder unavailable: {reason}. Try: {remediation}")]
    EmbedderUnavailable { reason: String, remediation: String },

    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    // Vector database errors
    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Collection '{name}' does not exist")]
    CollectionNotFound { name: String },

    #[error("Embedding dimension mismatch: collection expects {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    // Retrieval errors
    #[error("No indexed content found in collection '{collection}'. Run 'docchat ingest' first")]
    NoContext { collection: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, DocchatError>;
