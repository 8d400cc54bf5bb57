use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::models::{AssistantRequest, AssistantResponse, ChatRequest, ChatResponse};
use crate::state::AppState;

pub const MAX_QUESTION_CHARS: usize = 2000;

fn check_length(question: &str) -> Result<(), (StatusCode, String)> {
    if question.chars().count() > MAX_QUESTION_CHARS {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("Question exceeds {MAX_QUESTION_CHARS} character limit"),
        ));
    }
    Ok(())
}

/// POST /api/chat - Ask a question about an ingested repository
pub async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, (StatusCode, String)> {
    let repo_id = req.repo_id.trim();
    if repo_id.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "repo_id is required".to_string()));
    }
    let question = req.question.trim();
    if question.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Question cannot be empty".to_string()));
    }
    check_length(question)?;

    let response = state.engine.answer_for_repo(repo_id, question).await?;
    Ok(Json(response))
}

/// POST /api/assistant-chat - General assistant, no repository needed
pub async fn assistant_chat(
    State(state): State<AppState>,
    Json(req): Json<AssistantRequest>,
) -> Result<Json<AssistantResponse>, (StatusCode, String)> {
    let question = req.question.trim();
    check_length(question)?;
    Ok(Json(state.engine.answer_general(question).await))
}
