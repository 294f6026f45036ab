use pdfchat_rag::{QueryResult, SessionState};
use serde::{Deserialize, Serialize};

use crate::models::ModelInfo;

pub type SessionId = String;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionCreateResponse {
    pub session_id: SessionId,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelsResponse {
    pub default: &'static str,
    pub models: &'static [ModelInfo],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessResponse {
    pub model: String,
    pub chunk_count: usize,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceView {
    pub index: usize,
    pub page: usize,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResponse {
    pub answer: String,
    pub grounded: bool,
    /// Notice to display beneath an answer that did not use the document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disclosure: Option<String>,
    pub sources: Vec<SourceView>,
}

impl From<QueryResult> for AskResponse {
    fn from(result: QueryResult) -> Self {
        let grounded = result.is_grounded();
        let disclosure = result.disclosure().map(str::to_string);
        let sources = result
            .evidence
            .into_iter()
            .enumerate()
            .map(|(i, hit)| SourceView {
                index: i + 1,
                page: hit.chunk.page + 1,
                text: hit.chunk.text,
            })
            .collect();
        Self { answer: result.answer, grounded, disclosure, sources }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Idle,
    Ready,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub session_id: SessionId,
    pub status: SessionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_count: Option<usize>,
}

impl StatusResponse {
    pub fn from_state(session_id: SessionId, state: &SessionState) -> Self {
        match state {
            SessionState::Idle => {
                Self { session_id, status: SessionStatus::Idle, model: None, chunk_count: None }
            }
            SessionState::Ready(active) => Self {
                session_id,
                status: SessionStatus::Ready,
                model: Some(active.model().to_string()),
                chunk_count: Some(active.index().len()),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub level: MessageLevel,
    pub message: String,
}

impl ErrorBody {
    pub fn warning(message: impl Into<String>) -> Self {
        Self { level: MessageLevel::Warning, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: MessageLevel::Error, message: message.into() }
    }
}
