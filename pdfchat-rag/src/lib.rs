//! # pdfchat-rag
//!
//! Indexing and grounded question answering over a single uploaded PDF.
//!
//! ## Overview
//!
//! - [`DocumentIndexer`] turns PDF bytes into a [`DocumentIndex`]: text is
//!   extracted per page, split by [`RecursiveChunker`] (500 characters, 50
//!   characters overlap by default), embedded, and stored in an
//!   [`InMemoryVectorIndex`].
//! - [`AnsweringEngine`] retrieves the two chunks nearest to a question and
//!   answers from them, or, when none of them has content, answers from the
//!   model's general knowledge and marks the result [`Grounding::Ungrounded`].
//! - [`ChatSession`] holds one user's state and enforces the
//!   `Idle` → `Ready` lifecycle.
//!
//! External services sit behind [`EmbeddingProvider`], [`LanguageModel`] and
//! [`TextExtractor`]. The `ollama` feature provides [`ollama::OllamaClient`]
//! for the first two; the `pdf` feature provides [`PdfTextExtractor`].
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use pdfchat_rag::{AnsweringEngine, ChatSession, DocumentIndexer, ollama::OllamaClient};
//!
//! let ollama = Arc::new(OllamaClient::default());
//! let indexer = DocumentIndexer::builder().embedding_provider(ollama.clone()).build()?;
//! let engine = AnsweringEngine::builder()
//!     .embedding_provider(ollama.clone())
//!     .language_model(ollama)
//!     .build()?;
//!
//! let mut session = ChatSession::new();
//! session.process(&indexer, &pdf_bytes, "llama2").await?;
//! let result = session.ask(&engine, "What color is the sky?").await?;
//! ```

pub mod answer;
pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod extraction;
pub mod index;
pub mod indexer;
pub mod inmemory;
pub mod llm;
#[cfg(feature = "ollama")]
pub mod ollama;
pub mod session;
pub mod vectorstore;

pub use answer::{AnsweringEngine, AnsweringEngineBuilder, Grounding, QueryResult, UNGROUNDED_NOTICE};
pub use chunking::{Chunker, RecursiveChunker, TextSpan};
pub use config::{DEFAULT_SEPARATORS, RagConfig, RagConfigBuilder};
pub use document::{DocumentChunk, PageText, SearchResult};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use extraction::TextExtractor;
#[cfg(feature = "pdf")]
pub use extraction::{PdfTextExtractor, extract_pdf_bytes, with_temp_pdf};
pub use index::DocumentIndex;
pub use indexer::{DocumentIndexer, DocumentIndexerBuilder};
pub use inmemory::InMemoryVectorIndex;
pub use llm::{GenerationOptions, GenerationRequest, LanguageModel};
pub use session::{AnsweringSession, ChatSession, NO_DOCUMENT_MESSAGE, SessionState};
pub use vectorstore::VectorIndex;
