use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use pdfchat_rag::{
    AnsweringEngine, DocumentIndexer, RagConfig, RagError, RecursiveChunker, ollama::OllamaClient,
};
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::{
    models::{DEFAULT_MODEL, MODELS, find_model},
    protocol::{
        AskRequest, AskResponse, ErrorBody, ModelsResponse, ProcessResponse,
        SessionCreateResponse, StatusResponse,
    },
    session::{DEFAULT_SESSION_IDLE_TTL, SessionManager},
};

const DEFAULT_PORT: u16 = 8501;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionManager,
    pub indexer: Arc<DocumentIndexer>,
    pub engine: Arc<AnsweringEngine>,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(indexer: Arc<DocumentIndexer>, engine: Arc<AnsweringEngine>) -> Self {
        Self {
            sessions: SessionManager::default(),
            indexer,
            engine,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    pub fn with_max_upload_bytes(mut self, max_upload_bytes: usize) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }

    pub fn with_session_idle_ttl(mut self, idle_ttl: Duration) -> Self {
        self.sessions = SessionManager::with_idle_ttl(idle_ttl);
        self
    }

    /// Wire both collaborators to the Ollama server at `ollama_url`.
    pub fn with_ollama(ollama_url: &str, config: RagConfig) -> anyhow::Result<Self> {
        let ollama = Arc::new(OllamaClient::new(ollama_url));
        let indexer = DocumentIndexer::builder()
            .chunker(Arc::new(RecursiveChunker::from_config(&config)))
            .embedding_provider(ollama.clone())
            .build()
            .context("failed to build document indexer")?;
        let engine = AnsweringEngine::builder()
            .config(config)
            .embedding_provider(ollama.clone())
            .language_model(ollama)
            .build()
            .context("failed to build answering engine")?;
        Ok(Self::new(Arc::new(indexer), Arc::new(engine)))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub ollama_url: String,
    pub max_upload_bytes: usize,
    pub session_idle_ttl: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            ollama_url: pdfchat_rag::ollama::DEFAULT_OLLAMA_URL.to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            session_idle_ttl: DEFAULT_SESSION_IDLE_TTL,
        }
    }
}

impl ServerConfig {
    /// Read `PDFCHAT_HOST`, `PDFCHAT_PORT`, `PDFCHAT_OLLAMA_URL`,
    /// `PDFCHAT_MAX_UPLOAD_BYTES` and `PDFCHAT_SESSION_IDLE_SECS`, falling
    /// back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            host: lookup("PDFCHAT_HOST").unwrap_or(defaults.host),
            port: lookup("PDFCHAT_PORT")
                .and_then(|value| value.parse::<u16>().ok())
                .unwrap_or(defaults.port),
            ollama_url: lookup("PDFCHAT_OLLAMA_URL").unwrap_or(defaults.ollama_url),
            max_upload_bytes: lookup("PDFCHAT_MAX_UPLOAD_BYTES")
                .and_then(|value| value.parse::<usize>().ok())
                .unwrap_or(defaults.max_upload_bytes),
            session_idle_ttl: lookup("PDFCHAT_SESSION_IDLE_SECS")
                .and_then(|value| value.parse::<u64>().ok())
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.session_idle_ttl),
        }
    }
}

pub fn app_router(state: AppState) -> Router {
    let body_limit = DefaultBodyLimit::max(state.max_upload_bytes);

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/models", get(list_models))
        .route("/api/session", post(create_session))
        .route("/api/session/{session_id}", get(session_status))
        .route("/api/session/{session_id}/process", post(process_pdf))
        .route("/api/session/{session_id}/ask", post(ask_question))
        .with_state(state)
        .layer(body_limit)
        .layer(TraceLayer::new_for_http())
}

pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    let state = AppState::with_ollama(&config.ollama_url, RagConfig::default())?
        .with_max_upload_bytes(config.max_upload_bytes)
        .with_session_idle_ttl(config.session_idle_ttl);
    let app = app_router(state);
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| "invalid host/port for pdfchat server")?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(ollama_url = %config.ollama_url, "pdfchat listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

/// An error response: status code plus a `{ level, message }` body.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self { status: StatusCode::BAD_REQUEST, body: ErrorBody::error(message) }
    }

    fn unknown_session(session_id: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            body: ErrorBody::error(format!("unknown session `{session_id}`")),
        }
    }

    /// Map a library error, prefixing non-precondition messages with `action`.
    fn from_rag(action: &str, err: RagError) -> Self {
        let status = match &err {
            RagError::PreconditionError(message) => {
                return Self { status: StatusCode::CONFLICT, body: ErrorBody::warning(message.clone()) };
            }
            RagError::ExtractionError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            RagError::EmbeddingBackendError { .. } | RagError::InferenceBackendError { .. } => {
                StatusCode::BAD_GATEWAY
            }
            RagError::EmbeddingModelMismatch { .. }
            | RagError::VectorIndexError(_)
            | RagError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self { status, body: ErrorBody::error(format!("{action}: {err}")) }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

async fn index() -> impl IntoResponse {
    Html(include_str!("../ui/index.html"))
}

async fn health() -> impl IntoResponse {
    Json(json!({"status":"ok","service":"pdfchat"}))
}

async fn list_models() -> impl IntoResponse {
    Json(ModelsResponse { default: DEFAULT_MODEL, models: MODELS })
}

async fn create_session(State(state): State<AppState>) -> impl IntoResponse {
    let session_id = state.sessions.create_session().await;
    Json(SessionCreateResponse { session_id })
}

async fn session_status(
    Path(session_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<StatusResponse>, ApiError> {
    let handle = state
        .sessions
        .get(&session_id)
        .await
        .ok_or_else(|| ApiError::unknown_session(&session_id))?;
    let session = handle.lock().await;
    Ok(Json(StatusResponse::from_state(session_id, session.state())))
}

/// The two form fields of a processing request.
struct UploadForm {
    model: String,
    file_name: Option<String>,
    bytes: Vec<u8>,
}

async fn read_upload(mut multipart: Multipart) -> Result<UploadForm, ApiError> {
    let mut model = None;
    let mut file = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("invalid upload: {}", e.body_text())))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("model") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("invalid model field: {}", e.body_text())))?;
                model = Some(text.trim().to_string());
            }
            Some("file") => {
                let file_name = field.file_name().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("invalid file field: {}", e.body_text())))?;
                file = Some((file_name, bytes.to_vec()));
            }
            _ => {}
        }
    }

    let (file_name, bytes) = file
        .filter(|(_, bytes)| !bytes.is_empty())
        .ok_or_else(|| ApiError::bad_request("Please upload a PDF file."))?;
    let model = model.filter(|m| !m.is_empty()).unwrap_or_else(|| DEFAULT_MODEL.to_string());
    Ok(UploadForm { model, file_name, bytes })
}

async fn process_pdf(
    Path(session_id): Path<String>,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ProcessResponse>, ApiError> {
    let upload = read_upload(multipart).await?;
    if find_model(&upload.model).is_none() {
        return Err(ApiError::bad_request(format!("unknown model `{}`", upload.model)));
    }

    let handle = state.sessions.ensure_session(&session_id).await;
    let mut session = handle.lock().await;
    info!(
        session_id = %session_id,
        model = %upload.model,
        file_name = upload.file_name.as_deref().unwrap_or("<unnamed>"),
        size = upload.bytes.len(),
        "processing PDF"
    );

    let active = session
        .process(&state.indexer, &upload.bytes, &upload.model)
        .await
        .map_err(|e| {
            warn!(session_id = %session_id, error = %e, "PDF processing failed");
            ApiError::from_rag("Error processing PDF", e)
        })?;

    Ok(Json(ProcessResponse {
        model: active.model().to_string(),
        chunk_count: active.index().len(),
        message: "PDF processed successfully!".to_string(),
    }))
}

async fn ask_question(
    Path(session_id): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResponse>, ApiError> {
    let question = request.question.trim();
    if question.is_empty() {
        return Err(ApiError::bad_request("question cannot be empty"));
    }

    let handle = state
        .sessions
        .get(&session_id)
        .await
        .ok_or_else(|| ApiError::unknown_session(&session_id))?;
    let session = handle.lock().await;
    let result = session
        .ask(&state.engine, question)
        .await
        .map_err(|e| ApiError::from_rag("Error generating response", e))?;

    Ok(Json(AskResponse::from(result)))
}
