use crate::error::{DocchatError, Result};
use crate::models::{ChunkId, ChunkMetadata, ChunkSource, DocumentPage, TextChunk};
use chrono::Utc;

/// Chunking bounds, measured in whitespace-delimited words
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkConfig {
    /// Maximum words per chunk
    pub chunk_size: usize,

    /// Words repeated at the start of the next chunk for context preservation
    pub chunk_overlap: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self { chunk_size: 1000, chunk_overlap: 200 }
    }
}

impl ChunkConfig {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        let config = Self { chunk_size, chunk_overlap };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(DocchatError::ConfigInvalid {
                key: "chunk_size".to_string(),
                reason: "chunk_size must be greater than zero".to_string(),
            });
        }

        if self.chunk_overlap >= self.chunk_size {
            return Err(DocchatError::ConfigInvalid {
                key: "chunk_overlap".to_string(),
                reason: format!(
                    "overlap ({}) must be less than chunk_size ({})",
                    self.chunk_overlap, self.chunk_size
                ),
            });
        }

        Ok(())
    }
}

/// Chunk text into word-bounded segments with overlap.
///
/// Chunk content is a slice of the input, so interior whitespace and line
/// breaks are preserved. `offset` is the byte offset of the chunk within `text`.
pub fn chunk_text(
    text: &str,
    config: &ChunkConfig,
    document_path: &str,
    page: Option<usize>,
) -> Result<Vec<TextChunk>> {
    config.validate()?;

    let spans = word_spans(text);
    if spans.is_empty() {
        return Ok(Vec::new());
    }

    let ingested_at = Utc::now();
    let step = config.chunk_size - config.chunk_overlap;
    let mut chunks = Vec::new();
    let mut word_offset = 0;

    while word_offset < spans.len() {
        let end_word = (word_offset + config.chunk_size).min(spans.len());
        let start = spans[word_offset].0;
        let end = spans[end_word - 1].1;
        let content = text[start..end].to_string();

        chunks.push(TextChunk {
            id: ChunkId::new(),
            source: ChunkSource { document_path: document_path.to_string(), page, offset: start },
            metadata: ChunkMetadata { size: content.chars().count(), ingested_at },
            content,
        });

        if end_word >= spans.len() {
            break;
        }

        word_offset += step;
    }

    Ok(chunks)
}

/// Chunk every page of a document, keeping page numbers on the chunks
pub fn chunk_pages(pages: &[DocumentPage], config: &ChunkConfig) -> Result<Vec<TextChunk>> {
    let mut chunks = Vec::new();
    for page in pages {
        chunks.extend(chunk_text(&page.text, config, &page.document_path, Some(page.page))?);
    }
    Ok(chunks)
}

/// Byte ranges of whitespace-delimited words
fn word_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start = None;

    for (idx, ch) in text.char_indices() {
        if ch.is_whitespace() {
            if let Some(s) = start.take() {
                spans.push((s, idx));
            }
        } else if start.is_none() {
            start = Some(idx);
        }
    }

    if let Some(s) = start {
        spans.push((s, text.len()));
    }

    spans
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn words(chunk: &TextChunk) -> Vec<&str> {
        chunk.content.split_whitespace().collect()
    }

    #[test]
    fn test_chunk_text_short() {
        let text = "Short text.";
        let chunks = chunk_text(text, &ChunkConfig::default(), "paper.pdf", Some(1)).unwrap();

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, text);
        assert_eq!(chunks[0].source.page, Some(1));
        assert_eq!(chunks[0].source.offset, 0);
    }

    #[test]
    fn test_chunk_text_empty() {
        let chunks = chunk_text("  \n\t ", &ChunkConfig::default(), "paper.pdf", None).unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_chunk_config_validation() {
        assert!(ChunkConfig::new(100, 100).is_err());
        assert!(ChunkConfig::new(0, 0).is_err());
        assert!(ChunkConfig::new(100, 20).is_ok());
    }

    #[test]
    fn test_chunk_overlap() {
        let text = "one two three four five six seven eight nine ten";
        let config = ChunkConfig::new(4, 2).unwrap();

        let chunks = chunk_text(text, &config, "doc.pdf", None).unwrap();

        assert_eq!(words(&chunks[0]), vec!["one", "two", "three", "four"]);
        assert_eq!(words(&chunks[1]), vec!["three", "four", "five", "six"]);
        assert_eq!(words(&chunks[2]), vec!["five", "six", "seven", "eight"]);
        assert_eq!(words(&chunks[3]), vec!["seven", "eight", "nine", "ten"]);
        assert_eq!(chunks.len(), 4);
    }

    #[test]
    fn test_chunk_offsets_point_into_text() {
        let text = "Attention is all you need.\n\nThe dominant sequence transduction models";
        let config = ChunkConfig::new(3, 1).unwrap();

        let chunks = chunk_text(text, &config, "doc.pdf", None).unwrap();

        for chunk in &chunks {
            assert!(text[chunk.source.offset..].starts_with(&chunk.content));
        }
        for pair in chunks.windows(2) {
            assert!(pair[1].source.offset > pair[0].source.offset);
        }
    }

    #[test]
    fn test_chunk_text_multibyte() {
        let text = "Für Transformer-Modelle gilt: Aufmerksamkeit ist alles — wirklich alles.";
        let config = ChunkConfig::new(3, 1).unwrap();

        let chunks = chunk_text(text, &config, "doc.pdf", None).unwrap();

        assert!(chunks.len() > 1);
        assert!(chunks[0].content.starts_with("Für"));
        assert_eq!(chunks[0].metadata.size, chunks[0].content.chars().count());
    }

    #[test]
    fn test_chunk_pages_keeps_page_numbers() {
        let pages = vec![
            DocumentPage {
                document_path: "paper.pdf".to_string(),
                page: 1,
                text: "first page text".to_string(),
            },
            DocumentPage {
                document_path: "paper.pdf".to_string(),
                page: 2,
                text: "second page text".to_string(),
            },
        ];

        let chunks = chunk_pages(&pages, &ChunkConfig::default()).unwrap();

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].source.page, Some(1));
        assert_eq!(chunks[1].source.page, Some(2));
        assert_ne!(chunks[0].id, chunks[1].id);
    }

    proptest! {
        #[test]
        fn prop_chunks_cover_input_within_bounds(
            input in proptest::collection::vec("[a-z]{1,8}", 0..200),
            chunk_size in 2usize..40,
            overlap_ratio in 0usize..100,
        ) {
            let chunk_overlap = (chunk_size - 1) * overlap_ratio / 100;
            let config = ChunkConfig::new(chunk_size, chunk_overlap).unwrap();
            let text = input.join(" ");

            let chunks = chunk_text(&text, &config, "doc.pdf", None).unwrap();

            let mut reconstructed: Vec<&str> = Vec::new();
            for (i, chunk) in chunks.iter().enumerate() {
                let chunk_words = words(chunk);
                prop_assert!(chunk_words.len() <= chunk_size);
                let skip = if i == 0 { 0 } else { chunk_overlap };
                reconstructed.extend(chunk_words.into_iter().skip(skip));
            }

            let expected: Vec<&str> = input.iter().map(String::as_str).collect();
            prop_assert_eq!(reconstructed, expected);
        }
    }
}
