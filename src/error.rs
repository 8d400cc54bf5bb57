use std::path::PathBuf;

use axum::http::StatusCode;
use thiserror::Error;

/// Errors surfaced by the ingestion and question-answering core.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed URL or archive reference. Caller error.
    #[error("invalid source: {0}")]
    InvalidSource(String),

    /// Transport or extraction failure. Transient, the caller may retry.
    #[error("acquisition failed: {0}")]
    AcquisitionFailed(String),

    /// An archive entry would resolve outside the extraction root.
    #[error("archive entry escapes extraction root: {0}")]
    PathTraversal(String),

    /// The repository was never ingested or has been evicted from the store.
    #[error("repository {0} not found; it may have expired, please re-upload")]
    RepositoryNotFound(String),

    /// Cleanup was asked to delete something outside the repository root.
    #[error("refusing to delete path outside the repository root: {}", .0.display())]
    OutsideWorkspace(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// HTTP status used by the API layer for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidSource(_) | AppError::PathTraversal(_) => StatusCode::BAD_REQUEST,
            AppError::RepositoryNotFound(_) => StatusCode::NOT_FOUND,
            AppError::AcquisitionFailed(_) => StatusCode::BAD_GATEWAY,
            AppError::OutsideWorkspace(_) | AppError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<AppError> for (StatusCode, String) {
    fn from(err: AppError) -> Self {
        (err.status_code(), err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_404() {
        let (status, message) = AppError::RepositoryNotFound("abc".into()).into();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(message.contains("abc"));
        assert!(message.contains("not found"));
    }

    #[test]
    fn test_caller_errors_map_to_400() {
        assert_eq!(
            AppError::InvalidSource("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::PathTraversal("../x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }
}
