//! Document readers

pub mod pdf;

use async_trait::async_trait;
use std::path::Path;

use crate::error::{DocchatError, Result};
use crate::models::DocumentPage;

pub use pdf::PdfReader;

/// Port for turning a file on disk into pages of text
#[async_trait]
pub trait DocumentReader: Send + Sync {
    /// Read the document and return its non-empty pages
    async fn read(&self, path: &Path) -> Result<Vec<DocumentPage>>;

    /// File extensions handled by this reader (lowercase, without dot)
    fn supported_extensions(&self) -> &[&str];

    /// Human-readable format name
    fn format_name(&self) -> &str;
}

/// Pick a reader based on the file extension
pub fn reader_for_path(path: &Path) -> Result<Box<dyn DocumentReader>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let pdf = PdfReader;
    if pdf.supported_extensions().contains(&extension.as_str()) {
        return Ok(Box::new(pdf));
    }

    Err(DocchatError::DocumentExtraction {
        format: if extension.is_empty() { "unknown".to_string() } else { extension },
        reason: format!("Unsupported file type: {}", path.display()),
    })
}
