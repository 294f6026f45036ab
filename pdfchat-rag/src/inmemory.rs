//! In-memory vector index using cosine similarity.
//!
//! This module provides [`InMemoryVectorIndex`], an exact (brute-force)
//! nearest-neighbor index over a `Vec` of chunk/embedding pairs. A single
//! PDF yields at most a few thousand chunks, well within reach of a linear
//! scan.

use tracing::debug;

use crate::document::{DocumentChunk, SearchResult};
use crate::error::{RagError, Result};
use crate::vectorstore::VectorIndex;

/// An in-memory vector index using cosine similarity for search.
///
/// Entries are kept in insertion order. All embeddings must share the
/// dimension of the first one inserted.
#[derive(Debug, Default)]
pub struct InMemoryVectorIndex {
    entries: Vec<(DocumentChunk, Vec<f32>)>,
    dimensions: Option<usize>,
}

impl InMemoryVectorIndex {
    /// Create a new empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// The embedding dimension, once the first entry has been inserted.
    pub fn dimensions(&self) -> Option<usize> {
        self.dimensions
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

impl VectorIndex for InMemoryVectorIndex {
    fn insert(&mut self, chunk: DocumentChunk, embedding: Vec<f32>) -> Result<()> {
        if embedding.is_empty() {
            return Err(RagError::VectorIndexError(format!(
                "chunk {} has an empty embedding",
                chunk.position
            )));
        }
        match self.dimensions {
            Some(dimensions) if dimensions != embedding.len() => {
                return Err(RagError::VectorIndexError(format!(
                    "chunk {} has dimension {}, index expects {dimensions}",
                    chunk.position,
                    embedding.len()
                )));
            }
            Some(_) => {}
            None => self.dimensions = Some(embedding.len()),
        }
        self.entries.push((chunk, embedding));
        Ok(())
    }

    fn nearest(&self, query: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        if let Some(dimensions) = self.dimensions {
            if dimensions != query.len() {
                return Err(RagError::VectorIndexError(format!(
                    "query has dimension {}, index expects {dimensions}",
                    query.len()
                )));
            }
        }

        let mut scored: Vec<SearchResult> = self
            .entries
            .iter()
            .map(|(chunk, embedding)| SearchResult {
                chunk: chunk.clone(),
                score: cosine_similarity(embedding, query),
            })
            .collect();

        // `sort_by` is stable, so ties keep insertion order.
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        debug!(candidates = self.entries.len(), returned = scored.len(), "nearest neighbor search");
        Ok(scored)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(text: &str, position: usize) -> DocumentChunk {
        DocumentChunk::new(text, 0, position)
    }

    #[test]
    fn returns_most_similar_first() {
        let mut index = InMemoryVectorIndex::new();
        index.insert(chunk("x", 0), vec![1.0, 0.0]).unwrap();
        index.insert(chunk("y", 1), vec![0.0, 1.0]).unwrap();
        index.insert(chunk("xy", 2), vec![1.0, 1.0]).unwrap();

        let results = index.nearest(&[0.0, 2.0], 2).unwrap();
        let texts: Vec<&str> = results.iter().map(|r| r.chunk.text.as_str()).collect();
        assert_eq!(texts, vec!["y", "xy"]);
    }

    #[test]
    fn ties_keep_insertion_order() {
        let mut index = InMemoryVectorIndex::new();
        for position in 0..5 {
            index.insert(chunk("same", position), vec![0.5, 0.5]).unwrap();
        }
        let results = index.nearest(&[1.0, 1.0], 3).unwrap();
        let positions: Vec<usize> = results.iter().map(|r| r.chunk.position).collect();
        assert_eq!(positions, vec![0, 1, 2]);
    }

    #[test]
    fn rejects_mixed_dimensions() {
        let mut index = InMemoryVectorIndex::new();
        index.insert(chunk("a", 0), vec![1.0, 0.0, 0.0]).unwrap();
        let err = index.insert(chunk("b", 1), vec![1.0, 0.0]).unwrap_err();
        assert!(matches!(err, RagError::VectorIndexError(_)));
        assert!(index.nearest(&[1.0], 1).is_err());
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn empty_index_returns_nothing() {
        let index = InMemoryVectorIndex::new();
        assert!(index.is_empty());
        assert!(index.nearest(&[1.0, 2.0], 2).unwrap().is_empty());
    }
}
