use async_trait::async_trait;
use std::path::Path;

use crate::error::{DocchatError, Result};
use crate::formats::DocumentReader;
use crate::models::DocumentPage;

/// PDF format reader backed by `pdf-extract`
pub struct PdfReader;

#[async_trait]
impl DocumentReader for PdfReader {
    async fn read(&self, path: &Path) -> Result<Vec<DocumentPage>> {
        if !path.is_file() {
            return Err(DocchatError::DocumentNotFound { path: path.to_path_buf() });
        }

        let text =
            pdf_extract::extract_text(path).map_err(|e| DocchatError::DocumentExtraction {
                format: "PDF".to_string(),
                reason: format!("Failed to extract text: {}", e),
            })?;

        let pages = split_pages(&text, &path.display().to_string());

        if pages.is_empty() {
            tracing::warn!("PDF contains no extractable text: {}", path.display());
            return Err(DocchatError::EmptyDocument { path: path.to_path_buf() });
        }

        tracing::debug!(
            path = %path.display(),
            pages = pages.len(),
            characters = text.len(),
            "Extracted PDF text"
        );

        Ok(pages)
    }

    fn supported_extensions(&self) -> &[&str] {
        &["pdf"]
    }

    fn format_name(&self) -> &str {
        "PDF"
    }
}

/// Split extracted text into pages on form feed characters.
///
/// Page numbers count blank pages too, so they match the source document.
pub fn split_pages(text: &str, document_path: &str) -> Vec<DocumentPage> {
    text.split('\x0C')
        .enumerate()
        .filter(|(_, section)| !section.trim().is_empty())
        .map(|(idx, section)| DocumentPage {
            document_path: document_path.to_string(),
            page: idx + 1,
            text: section.trim().to_string(),
        })
        .collect()
}
