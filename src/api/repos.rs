use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::RepoSummary;
use crate::state::AppState;

/// GET /api/repos/{id}/summary - Summary of an ingested repository
pub async fn get_summary(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RepoSummary>, (StatusCode, String)> {
    let summary = state
        .store
        .get_summary(&id)
        .ok_or_else(|| AppError::RepositoryNotFound(id.to_string()))?;
    Ok(Json(RepoSummary::clone(&summary)))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub stored_repos: usize,
    pub provider: String,
    pub models: Vec<String>,
}

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        stored_repos: state.store.len(),
        provider: state.config.llm.provider.clone(),
        models: state.cascade.models().to_vec(),
    })
}
