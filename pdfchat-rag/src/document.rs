//! Data types for extracted pages, chunks, and search results.

use serde::{Deserialize, Serialize};

/// The text of one PDF page as returned by a [`TextExtractor`](crate::TextExtractor).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageText {
    /// Zero-based page index within the document.
    pub index: usize,
    /// The extracted text of the page.
    pub text: String,
}

impl PageText {
    /// Create a page from its index and text.
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self { index, text: text.into() }
    }
}

/// A contiguous span of extracted text, the unit of embedding and retrieval.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentChunk {
    /// The text content of the chunk.
    pub text: String,
    /// The page the chunk was cut from.
    pub page: usize,
    /// Position of the chunk in document order, counted across all pages.
    pub position: usize,
}

impl DocumentChunk {
    /// Create a chunk.
    pub fn new(text: impl Into<String>, page: usize, position: usize) -> Self {
        Self { text: text.into(), page, position }
    }

    /// Whether the chunk carries any non-whitespace content.
    pub fn has_content(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

/// A retrieved [`DocumentChunk`] paired with a relevance score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// The retrieved chunk.
    pub chunk: DocumentChunk,
    /// The similarity score (higher is more relevant).
    pub score: f32,
}
