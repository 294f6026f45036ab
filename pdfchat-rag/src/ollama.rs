//! Ollama embedding and generation backend.
//!
//! This module is only available when the `ollama` feature is enabled.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::llm::{GenerationOptions, GenerationRequest, LanguageModel};

/// The default local Ollama endpoint.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// An [`EmbeddingProvider`] and [`LanguageModel`] backed by an Ollama server.
///
/// Uses `reqwest` to call `/api/embed` and `/api/generate` directly. One
/// client serves every model the server has pulled.
///
/// # Example
///
/// ```rust,ignore
/// use pdfchat_rag::ollama::OllamaClient;
///
/// let ollama = OllamaClient::new("http://localhost:11434");
/// let embedding = ollama.embed("llama2", "hello world").await?;
/// ```
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
}

impl Default for OllamaClient {
    fn default() -> Self {
        Self::new(DEFAULT_OLLAMA_URL)
    }
}

impl OllamaClient {
    /// Create a client for the server at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Create a client reusing an existing `reqwest::Client`.
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    /// The server base URL, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST `body` to `path` and decode a JSON response.
    ///
    /// Failures are returned as a plain message; callers wrap it in the
    /// error variant that matches the endpoint.
    async fn post_json<B, R>(&self, path: &str, body: &B) -> std::result::Result<R, String>
    where
        B: Serialize + Sync,
        R: for<'de> Deserialize<'de>,
    {
        let url = format!("{}{path}", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| format!("request to {url} failed: {e}"))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let detail =
                serde_json::from_str::<ErrorResponse>(&body).map(|e| e.error).unwrap_or(body);
            return Err(format!("API returned {status}: {detail}"));
        }

        response.json().await.map_err(|e| format!("failed to parse response: {e}"))
    }
}

// ── Ollama API request/response types ──────────────────────────────

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<ModelOptions>,
}

#[derive(Serialize)]
struct ModelOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_ctx: Option<u32>,
}

impl ModelOptions {
    fn from_options(options: &GenerationOptions) -> Option<Self> {
        if options.temperature.is_none() && options.context_window.is_none() {
            return None;
        }
        Some(Self { temperature: options.temperature, num_ctx: options.context_window })
    }
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

// ── Trait implementations ──────────────────────────────────────────

#[async_trait]
impl EmbeddingProvider for OllamaClient {
    async fn embed(&self, model: &str, text: &str) -> Result<Vec<f32>> {
        debug!(provider = "Ollama", model, text_len = text.len(), "embedding single text");

        let results = self.embed_batch(model, &[text]).await?;
        results.into_iter().next().ok_or_else(|| RagError::EmbeddingBackendError {
            model: model.to_string(),
            message: "API returned empty response".into(),
        })
    }

    async fn embed_batch(&self, model: &str, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(provider = "Ollama", model, batch_size = texts.len(), "embedding batch");

        let request = EmbedRequest { model, input: texts };
        let response: EmbedResponse =
            self.post_json("/api/embed", &request).await.map_err(|message| {
                error!(provider = "Ollama", model, error = %message, "embedding request failed");
                RagError::EmbeddingBackendError { model: model.to_string(), message }
            })?;

        if response.embeddings.len() != texts.len() {
            return Err(RagError::EmbeddingBackendError {
                model: model.to_string(),
                message: format!(
                    "requested {} embeddings, received {}",
                    texts.len(),
                    response.embeddings.len()
                ),
            });
        }

        Ok(response.embeddings)
    }
}

#[async_trait]
impl LanguageModel for OllamaClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        debug!(
            provider = "Ollama",
            model = %request.model,
            prompt_len = request.prompt.len(),
            temperature = ?request.options.temperature,
            context_window = ?request.options.context_window,
            "generating completion"
        );

        let body = GenerateRequest {
            model: &request.model,
            prompt: &request.prompt,
            stream: false,
            options: ModelOptions::from_options(&request.options),
        };
        let response: GenerateResponse =
            self.post_json("/api/generate", &body).await.map_err(|message| {
                error!(provider = "Ollama", model = %request.model, error = %message, "generation failed");
                RagError::InferenceBackendError { model: request.model.clone(), message }
            })?;

        Ok(response.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_trailing_slash_from_base_url() {
        assert_eq!(OllamaClient::new("http://host:11434/").base_url(), "http://host:11434");
        assert_eq!(OllamaClient::default().base_url(), DEFAULT_OLLAMA_URL);
    }

    #[test]
    fn generate_request_omits_unset_options() {
        let body = GenerateRequest {
            model: "llama2",
            prompt: "hi",
            stream: false,
            options: ModelOptions::from_options(&GenerationOptions::default()),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json, serde_json::json!({"model": "llama2", "prompt": "hi", "stream": false}));
    }

    #[test]
    fn generate_request_maps_context_window_to_num_ctx() {
        let options = GenerationOptions { temperature: Some(0.5), context_window: Some(2048) };
        let body = GenerateRequest {
            model: "mistral",
            prompt: "hi",
            stream: false,
            options: ModelOptions::from_options(&options),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["options"], serde_json::json!({"temperature": 0.5, "num_ctx": 2048}));
    }
}
