//! Document indexer: PDF bytes → pages → chunks → embeddings → index.
//!
//! # Example
//!
//! ```rust,ignore
//! use pdfchat_rag::{DocumentIndexer, ollama::OllamaClient};
//!
//! let indexer = DocumentIndexer::builder()
//!     .embedding_provider(Arc::new(OllamaClient::default()))
//!     .build()?;
//!
//! let index = indexer.build_index(&pdf_bytes, "llama2").await?;
//! ```

use std::sync::Arc;

use tracing::{error, info};

use crate::chunking::{Chunker, RecursiveChunker};
use crate::document::PageText;
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::extraction::TextExtractor;
use crate::index::DocumentIndex;

/// Builds a fresh [`DocumentIndex`] for each uploaded document.
///
/// Coordinates extraction (on the blocking pool), chunking, batch embedding
/// and insertion. Construct one via [`DocumentIndexer::builder()`].
pub struct DocumentIndexer {
    extractor: Arc<dyn TextExtractor>,
    chunker: Arc<dyn Chunker>,
    embedding_provider: Arc<dyn EmbeddingProvider>,
}

impl DocumentIndexer {
    /// Create a new [`DocumentIndexerBuilder`].
    pub fn builder() -> DocumentIndexerBuilder {
        DocumentIndexerBuilder::default()
    }

    /// Return a reference to the embedding provider.
    pub fn embedding_provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedding_provider
    }

    /// Extract, chunk, and embed `pdf_bytes` into a new index.
    ///
    /// A document without extractable text yields an empty index and makes
    /// no embedding call. The index is only returned once every chunk is
    /// embedded and inserted; on error nothing is returned.
    ///
    /// # Errors
    ///
    /// - [`RagError::ExtractionError`] if the bytes are not a parseable PDF.
    /// - [`RagError::EmbeddingBackendError`] if embedding fails.
    pub async fn build_index(&self, pdf_bytes: &[u8], embedding_model: &str) -> Result<DocumentIndex> {
        // 1. Extract page text off the async runtime
        let pages = self.extract(pdf_bytes.to_vec()).await?;

        // 2. Chunk
        let chunks = self.chunker.chunk(&pages);
        let mut index = DocumentIndex::new(embedding_model);
        if chunks.is_empty() {
            info!(embedding_model, page_count = pages.len(), chunk_count = 0, "indexed document (no text)");
            return Ok(index);
        }

        // 3. Embed every chunk with the index's model
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let embeddings = self.embedding_provider.embed_batch(embedding_model, &texts).await.map_err(|e| {
            error!(embedding_model, error = %e, "embedding failed during indexing");
            e
        })?;
        if embeddings.len() != chunks.len() {
            return Err(RagError::EmbeddingBackendError {
                model: embedding_model.to_string(),
                message: format!("expected {} embeddings, received {}", chunks.len(), embeddings.len()),
            });
        }

        // 4. Insert into the fresh index
        let chunk_count = chunks.len();
        for (chunk, embedding) in chunks.into_iter().zip(embeddings) {
            index.insert(chunk, embedding)?;
        }

        info!(embedding_model, page_count = pages.len(), chunk_count, "indexed document");
        Ok(index)
    }

    async fn extract(&self, pdf_bytes: Vec<u8>) -> Result<Vec<PageText>> {
        let extractor = Arc::clone(&self.extractor);
        tokio::task::spawn_blocking(move || extract_bytes(extractor.as_ref(), &pdf_bytes))
            .await
            .map_err(|e| RagError::ExtractionError(format!("extraction task failed: {e}")))?
    }
}

#[cfg(feature = "pdf")]
fn extract_bytes(extractor: &dyn TextExtractor, bytes: &[u8]) -> Result<Vec<PageText>> {
    crate::extraction::extract_pdf_bytes(extractor, bytes)
}

#[cfg(not(feature = "pdf"))]
fn extract_bytes(_extractor: &dyn TextExtractor, _bytes: &[u8]) -> Result<Vec<PageText>> {
    Err(RagError::ExtractionError("PDF support is disabled (enable the `pdf` feature)".to_string()))
}

/// Builder for constructing a [`DocumentIndexer`].
///
/// The embedding provider is required. The extractor defaults to
/// [`PdfTextExtractor`](crate::PdfTextExtractor) (with the `pdf` feature) and
/// the chunker to [`RecursiveChunker::default()`].
#[derive(Default)]
pub struct DocumentIndexerBuilder {
    extractor: Option<Arc<dyn TextExtractor>>,
    chunker: Option<Arc<dyn Chunker>>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
}

impl DocumentIndexerBuilder {
    /// Set the text extractor.
    pub fn extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    /// Set the chunker.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Build the [`DocumentIndexer`].
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if the embedding provider is missing,
    /// or if no extractor was given and the `pdf` feature is disabled.
    pub fn build(self) -> Result<DocumentIndexer> {
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::ConfigError("embedding_provider is required".to_string()))?;
        let extractor = match self.extractor {
            Some(extractor) => extractor,
            None => default_extractor()?,
        };
        let chunker = self.chunker.unwrap_or_else(|| Arc::new(RecursiveChunker::default()));

        Ok(DocumentIndexer { extractor, chunker, embedding_provider })
    }
}

#[cfg(feature = "pdf")]
fn default_extractor() -> Result<Arc<dyn TextExtractor>> {
    Ok(Arc::new(crate::extraction::PdfTextExtractor))
}

#[cfg(not(feature = "pdf"))]
fn default_extractor() -> Result<Arc<dyn TextExtractor>> {
    Err(RagError::ConfigError("extractor is required without the `pdf` feature".to_string()))
}
