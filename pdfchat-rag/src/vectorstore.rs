//! Vector index trait for storing and searching chunk embeddings.

use crate::document::{DocumentChunk, SearchResult};
use crate::error::Result;

/// A nearest-neighbor structure over chunk embeddings.
///
/// An index is filled once at build time and only read afterwards, so the
/// trait takes `&mut self` for inserts and needs no interior locking.
///
/// # Example
///
/// ```rust,ignore
/// use pdfchat_rag::{InMemoryVectorIndex, VectorIndex};
///
/// let mut index = InMemoryVectorIndex::new();
/// index.insert(chunk, embedding)?;
/// let results = index.nearest(&query_embedding, 2)?;
/// ```
pub trait VectorIndex: Send + Sync {
    /// Add a chunk with its embedding.
    fn insert(&mut self, chunk: DocumentChunk, embedding: Vec<f32>) -> Result<()>;

    /// Return at most `k` chunks most similar to `query`.
    ///
    /// Results are ordered by descending similarity; equal scores keep
    /// insertion order.
    fn nearest(&self, query: &[f32], k: usize) -> Result<Vec<SearchResult>>;

    /// Number of stored chunks.
    fn len(&self) -> usize;

    /// Whether the index holds no chunks.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
