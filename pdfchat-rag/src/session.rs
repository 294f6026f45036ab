//! Per-user chat session state.
//!
//! A session starts `Idle`. Processing a document moves it to `Ready` with a
//! fresh [`AnsweringSession`]; processing again replaces that session
//! wholesale. Questions are only accepted while `Ready`.

use std::sync::Arc;

use tracing::{info, warn};

use crate::answer::{AnsweringEngine, QueryResult};
use crate::error::{RagError, Result};
use crate::index::DocumentIndex;
use crate::indexer::DocumentIndexer;

/// Message returned when a question arrives before any document was processed.
pub const NO_DOCUMENT_MESSAGE: &str = "Please upload and process a PDF first.";

/// One processed document bound to the language model chosen for it.
#[derive(Debug, Clone)]
pub struct AnsweringSession {
    index: Arc<DocumentIndex>,
    model: String,
}

impl AnsweringSession {
    /// Bind `index` to `model`.
    pub fn new(index: Arc<DocumentIndex>, model: impl Into<String>) -> Self {
        Self { index, model: model.into() }
    }

    /// The shared index.
    pub fn index(&self) -> &Arc<DocumentIndex> {
        &self.index
    }

    /// The language model identifier.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Answer `question` against this session's index and model.
    pub async fn ask(&self, engine: &AnsweringEngine, question: &str) -> Result<QueryResult> {
        engine.answer(question, &self.index, &self.model).await
    }
}

/// Lifecycle state of a [`ChatSession`].
#[derive(Debug, Clone, Default)]
pub enum SessionState {
    /// No document has been processed yet.
    #[default]
    Idle,
    /// A document is indexed and questions can be answered.
    Ready(AnsweringSession),
}

/// The state one user's events operate on.
///
/// Callers serialize events per session (`process` takes `&mut self`).
#[derive(Debug, Default)]
pub struct ChatSession {
    state: SessionState,
}

impl ChatSession {
    /// Create an idle session.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Whether a document has been processed.
    pub fn is_ready(&self) -> bool {
        matches!(self.state, SessionState::Ready(_))
    }

    /// The active answering session, if any.
    pub fn answering_session(&self) -> Option<&AnsweringSession> {
        match &self.state {
            SessionState::Idle => None,
            SessionState::Ready(session) => Some(session),
        }
    }

    /// Index `pdf_bytes` with `model` and make it the active document.
    ///
    /// The same model identifier is used for embeddings and for answers. On
    /// failure the previous state is kept untouched.
    pub async fn process(
        &mut self,
        indexer: &DocumentIndexer,
        pdf_bytes: &[u8],
        model: &str,
    ) -> Result<AnsweringSession> {
        let index = indexer.build_index(pdf_bytes, model).await?;
        info!(model, chunk_count = index.len(), replaced = self.is_ready(), "document ready");
        let session = AnsweringSession::new(Arc::new(index), model);
        self.state = SessionState::Ready(session.clone());
        Ok(session)
    }

    /// Answer `question` with the active document.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::PreconditionError`] while no document has been
    /// processed; no collaborator is called in that case. Answering errors
    /// leave the session unchanged.
    pub async fn ask(&self, engine: &AnsweringEngine, question: &str) -> Result<QueryResult> {
        match &self.state {
            SessionState::Idle => {
                warn!("question rejected: no document processed");
                Err(RagError::PreconditionError(NO_DOCUMENT_MESSAGE.to_string()))
            }
            SessionState::Ready(session) => session.ask(engine, question).await,
        }
    }
}
