//! The per-document index: chunk embeddings tagged with the model that produced them.

use std::fmt;

use crate::document::{DocumentChunk, SearchResult};
use crate::error::{RagError, Result};
use crate::inmemory::InMemoryVectorIndex;
use crate::vectorstore::VectorIndex;

/// All chunks of one processed document with their embeddings.
///
/// Every vector in the index was produced by `embedding_model`; searches
/// state the model their query vector came from and are refused when it
/// differs.
pub struct DocumentIndex {
    embedding_model: String,
    store: Box<dyn VectorIndex>,
}

impl DocumentIndex {
    /// Create an empty index backed by an [`InMemoryVectorIndex`].
    pub fn new(embedding_model: impl Into<String>) -> Self {
        Self::with_store(embedding_model, Box::new(InMemoryVectorIndex::new()))
    }

    /// Create an empty index backed by the given store.
    pub fn with_store(embedding_model: impl Into<String>, store: Box<dyn VectorIndex>) -> Self {
        Self { embedding_model: embedding_model.into(), store }
    }

    /// The model every embedding in this index was computed with.
    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    /// Number of chunks.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Whether the index holds no chunks.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Add a chunk with the embedding computed by [`embedding_model`](Self::embedding_model).
    pub fn insert(&mut self, chunk: DocumentChunk, embedding: Vec<f32>) -> Result<()> {
        self.store.insert(chunk, embedding)
    }

    /// Return the `k` chunks nearest to `query`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmbeddingModelMismatch`] if `query_model` is not
    /// the model the index was built with.
    pub fn search(&self, query_model: &str, query: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        if query_model != self.embedding_model {
            return Err(RagError::EmbeddingModelMismatch {
                index_model: self.embedding_model.clone(),
                query_model: query_model.to_string(),
            });
        }
        self.store.nearest(query, k)
    }
}

impl fmt::Debug for DocumentIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentIndex")
            .field("embedding_model", &self.embedding_model)
            .field("len", &self.store.len())
            .finish()
    }
}
