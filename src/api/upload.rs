use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;

use crate::acquire::Source;
use crate::models::{ArchiveUploadQuery, UploadRequest, UploadResult};
use crate::pipeline::ingest;
use crate::state::AppState;

/// POST /api/upload - Ingest a GitHub URL or a pasted snippet
pub async fn upload(
    State(state): State<AppState>,
    Json(req): Json<UploadRequest>,
) -> Result<Json<UploadResult>, (StatusCode, String)> {
    let source = match (req.github_url, req.text) {
        (Some(url), None) => Source::RemoteUrl(url),
        (None, Some(text)) => Source::Text {
            text,
            name: req.name,
        },
        (Some(_), Some(_)) => {
            return Err((
                StatusCode::BAD_REQUEST,
                "Send either `github_url` or `text`, not both".to_string(),
            ));
        }
        (None, None) => {
            return Err((
                StatusCode::BAD_REQUEST,
                "Missing `github_url` or `text` field".to_string(),
            ));
        }
    };

    let result = ingest(&state, source).await?;
    Ok(Json(result))
}

/// POST /api/upload/zip?name=project.zip - Ingest a ZIP archive sent as the body
pub async fn upload_zip(
    State(state): State<AppState>,
    Query(query): Query<ArchiveUploadQuery>,
    body: Bytes,
) -> Result<Json<UploadResult>, (StatusCode, String)> {
    if body.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Archive body is empty".to_string()));
    }

    let source = Source::Archive {
        bytes: body.to_vec(),
        file_name: query.name,
    };
    let result = ingest(&state, source).await?;
    Ok(Json(result))
}
