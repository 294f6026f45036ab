//! Deterministic collaborators shared by the integration tests.
#![allow(dead_code)]

use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use pdfchat_rag::{
    EmbeddingProvider, GenerationRequest, LanguageModel, PageText, RagError, Result, TextExtractor,
};

const DIMENSIONS: usize = 64;

/// Bag-of-words embeddings: texts that share words point in similar directions.
#[derive(Default)]
pub struct KeywordEmbedder {
    pub calls: AtomicUsize,
    pub models: Mutex<Vec<String>>,
    pub fail: bool,
}

impl KeywordEmbedder {
    pub fn failing() -> Self {
        Self { fail: true, ..Self::default() }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen_models(&self) -> Vec<String> {
        self.models.lock().unwrap().clone()
    }
}

pub fn keyword_vector(text: &str) -> Vec<f32> {
    let mut v = vec![0.0f32; DIMENSIONS];
    v[0] = 0.01;
    for word in text.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
        let hash = word
            .to_lowercase()
            .bytes()
            .fold(7u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
        v[1 + (hash as usize % (DIMENSIONS - 1))] += 1.0;
    }
    v
}

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    async fn embed(&self, model: &str, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.models.lock().unwrap().push(model.to_string());
        if self.fail {
            return Err(RagError::EmbeddingBackendError {
                model: model.to_string(),
                message: "connection refused".to_string(),
            });
        }
        Ok(keyword_vector(text))
    }
}

/// Records every request and answers with a fixed reply.
pub struct RecordingModel {
    pub reply: String,
    pub fail: bool,
    pub requests: Mutex<Vec<GenerationRequest>>,
}

impl RecordingModel {
    pub fn replying(reply: &str) -> Self {
        Self { reply: reply.to_string(), fail: false, requests: Mutex::new(Vec::new()) }
    }

    pub fn failing() -> Self {
        Self { fail: true, ..Self::replying("") }
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for RecordingModel {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        self.requests.lock().unwrap().push(request.clone());
        if self.fail {
            return Err(RagError::InferenceBackendError {
                model: request.model.clone(),
                message: format!("model \"{}\" not found", request.model),
            });
        }
        Ok(self.reply.clone())
    }
}

/// Returns the same pages for every file and counts calls.
pub struct StaticExtractor {
    pub pages: Vec<String>,
    pub calls: AtomicUsize,
}

impl StaticExtractor {
    pub fn new<I, S>(pages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { pages: pages.into_iter().map(Into::into).collect(), calls: AtomicUsize::new(0) }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TextExtractor for StaticExtractor {
    fn extract_pages(&self, path: &Path) -> Result<Vec<PageText>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert!(path.exists());
        Ok(self.pages.iter().enumerate().map(|(i, text)| PageText::new(i, text.clone())).collect())
    }
}

/// Bytes that pass the PDF header check.
pub const FAKE_PDF: &[u8] = b"%PDF-1.4\n% test document\n%%EOF";
