//! Language-model trait for text generation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Sampling parameters for a generation request.
///
/// `None` leaves the backend's own default in place.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Context window in tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_window: Option<u32>,
}

/// A single non-streaming completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// The model identifier.
    pub model: String,
    /// The full prompt text.
    pub prompt: String,
    /// Sampling parameters.
    pub options: GenerationOptions,
}

impl GenerationRequest {
    /// Create a request with default options.
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self { model: model.into(), prompt: prompt.into(), options: GenerationOptions::default() }
    }

    /// Set the sampling options.
    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }
}

/// A language-model backend that turns a prompt into generated text.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Generate a completion for the request.
    ///
    /// Implementations return [`RagError::InferenceBackendError`](crate::RagError::InferenceBackendError)
    /// when the service is unreachable or does not know the model.
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;
}
