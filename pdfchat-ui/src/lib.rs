//! `pdfchat-ui` serves the single-page PDF chat assistant.
//! The page talks to a small JSON/multipart API; each browser session owns
//! one [`pdfchat_rag::ChatSession`].

pub mod models;
pub mod protocol;
pub mod server;
pub mod session;

pub use server::{ApiError, AppState, ServerConfig, app_router, run_server};
