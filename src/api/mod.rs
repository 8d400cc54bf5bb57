//! Thin axum surface over the ingestion pipeline and the answering engine.

pub mod chat;
pub mod repos;
pub mod upload;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// All API routes, with the archive route's body limit taken from config.
pub fn router(state: AppState) -> Router {
    let max_upload = state.config.acquire.max_upload_bytes();

    Router::new()
        .route("/api/health", get(repos::health))
        .route("/api/upload", post(upload::upload))
        .route(
            "/api/upload/zip",
            post(upload::upload_zip).layer(DefaultBodyLimit::max(max_upload)),
        )
        .route("/api/repos/{id}/summary", get(repos::get_summary))
        .route("/api/chat", post(chat::chat))
        .route("/api/assistant-chat", post(chat::assistant_chat))
        .with_state(state)
}
