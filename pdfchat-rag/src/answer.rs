//! Answering engine: retrieval, grounding test, and generation.
//!
//! A question is answered from the document when retrieval finds at least
//! one chunk with content; otherwise the language model answers from its own
//! knowledge and the result says so.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::config::RagConfig;
use crate::document::SearchResult;
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::index::DocumentIndex;
use crate::llm::{GenerationOptions, GenerationRequest, LanguageModel};

/// Notice attached to every answer that did not use the document.
pub const UNGROUNDED_NOTICE: &str = "This response is based on the model's general knowledge as no relevant information was found in the PDF.";

const STUFF_PROMPT_PREAMBLE: &str = "Use the following pieces of context to answer the question at the end. If you don't know the answer, just say that you don't know, don't try to make up an answer.";

/// Whether an answer was generated from retrieved document text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grounding {
    /// The answer used retrieved chunks as context.
    Grounded,
    /// The answer came from the model's general knowledge.
    Ungrounded,
}

/// The outcome of one question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    /// The generated answer text.
    pub answer: String,
    /// Retrieved chunks used as context, most similar first. Empty when ungrounded.
    pub evidence: Vec<SearchResult>,
    /// Whether the answer is grounded in the document.
    pub grounding: Grounding,
}

impl QueryResult {
    /// Whether the answer is grounded in the document.
    pub fn is_grounded(&self) -> bool {
        self.grounding == Grounding::Grounded
    }

    /// The notice that must be shown alongside an ungrounded answer.
    pub fn disclosure(&self) -> Option<&'static str> {
        match self.grounding {
            Grounding::Grounded => None,
            Grounding::Ungrounded => Some(UNGROUNDED_NOTICE),
        }
    }
}

/// Retrieved chunks ground an answer iff at least one has non-whitespace text.
pub fn is_grounded(results: &[SearchResult]) -> bool {
    results.iter().any(|r| r.chunk.has_content())
}

/// Compose the single "stuff everything into one prompt" request.
pub fn build_grounded_prompt(question: &str, evidence: &[SearchResult]) -> String {
    let context =
        evidence.iter().map(|r| r.chunk.text.as_str()).collect::<Vec<_>>().join("\n\n");
    format!("{STUFF_PROMPT_PREAMBLE}\n\n{context}\n\nQuestion: {question}\nHelpful Answer:")
}

/// Answers questions against a [`DocumentIndex`].
///
/// The question is embedded with the index's own embedding model, so query
/// and document vectors always come from the same model. Both the grounded
/// and the ungrounded path use the configured temperature and context window.
pub struct AnsweringEngine {
    config: RagConfig,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    language_model: Arc<dyn LanguageModel>,
}

impl AnsweringEngine {
    /// Create a new [`AnsweringEngineBuilder`].
    pub fn builder() -> AnsweringEngineBuilder {
        AnsweringEngineBuilder::default()
    }

    /// Return a reference to the engine configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    fn generation_options(&self) -> GenerationOptions {
        GenerationOptions {
            temperature: Some(self.config.temperature),
            context_window: Some(self.config.context_window),
        }
    }

    /// Retrieve the `top_k` chunks nearest to `question`.
    ///
    /// An empty index returns no chunks without calling the embedding provider.
    pub async fn retrieve(&self, question: &str, index: &DocumentIndex) -> Result<Vec<SearchResult>> {
        if index.is_empty() {
            return Ok(Vec::new());
        }
        let model = index.embedding_model();
        let query = self.embedding_provider.embed(model, question).await.map_err(|e| {
            error!(embedding_model = model, error = %e, "query embedding failed");
            e
        })?;
        index.search(model, &query, self.config.top_k)
    }

    /// Answer `question` with `model`, grounded in `index` when possible.
    ///
    /// # Errors
    ///
    /// - [`RagError::EmbeddingBackendError`] if the question cannot be embedded.
    /// - [`RagError::InferenceBackendError`] if generation fails.
    pub async fn answer(&self, question: &str, index: &DocumentIndex, model: &str) -> Result<QueryResult> {
        let retrieved = self.retrieve(question, index).await?;

        let (prompt, evidence, grounding) = if is_grounded(&retrieved) {
            (build_grounded_prompt(question, &retrieved), retrieved, Grounding::Grounded)
        } else {
            (question.to_string(), Vec::new(), Grounding::Ungrounded)
        };

        let request = GenerationRequest::new(model, prompt).with_options(self.generation_options());
        let answer = self.language_model.generate(&request).await.map_err(|e| {
            error!(model, error = %e, "answer generation failed");
            match e {
                RagError::InferenceBackendError { .. } => e,
                other => RagError::InferenceBackendError {
                    model: model.to_string(),
                    message: other.to_string(),
                },
            }
        })?;

        info!(model, ?grounding, evidence_count = evidence.len(), "answered question");
        Ok(QueryResult { answer, evidence, grounding })
    }
}

/// Builder for constructing an [`AnsweringEngine`].
///
/// The embedding provider and language model are required; the config
/// defaults to [`RagConfig::default()`].
#[derive(Default)]
pub struct AnsweringEngineBuilder {
    config: Option<RagConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    language_model: Option<Arc<dyn LanguageModel>>,
}

impl AnsweringEngineBuilder {
    /// Set the configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider used for questions.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the language model.
    pub fn language_model(mut self, model: Arc<dyn LanguageModel>) -> Self {
        self.language_model = Some(model);
        self
    }

    /// Build the [`AnsweringEngine`], validating that all required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if any required field is missing.
    pub fn build(self) -> Result<AnsweringEngine> {
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::ConfigError("embedding_provider is required".to_string()))?;
        let language_model = self
            .language_model
            .ok_or_else(|| RagError::ConfigError("language_model is required".to_string()))?;

        Ok(AnsweringEngine {
            config: self.config.unwrap_or_default(),
            embedding_provider,
            language_model,
        })
    }
}
