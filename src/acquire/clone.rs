use std::path::Path;

use git2::build::RepoBuilder;
use git2::{Cred, FetchOptions, RemoteCallbacks};
use url::Url;

use crate::error::AppError;

/// A remote repository reference that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRepo {
    /// `https://<host>/<owner>/<repo>`, without extra path segments or query.
    pub clone_url: String,
    pub owner: String,
    pub name: String,
}

/// Accept only `https://<allowed_host>/<owner>/<repo>[/...]`.
pub fn validate_remote_url(raw: &str, allowed_host: &str) -> Result<RemoteRepo, AppError> {
    let invalid = |reason: &str| AppError::InvalidSource(format!("{reason}: {raw}"));

    let url = Url::parse(raw.trim()).map_err(|_| invalid("malformed URL"))?;
    if url.scheme() != "https" {
        return Err(invalid("only https URLs are accepted"));
    }
    let host = url.host_str().unwrap_or_default();
    if !host.eq_ignore_ascii_case(allowed_host) {
        return Err(invalid(&format!("only {allowed_host} repositories are accepted")));
    }

    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();
    if segments.len() < 2 {
        return Err(invalid("URL must name an owner and a repository"));
    }

    let owner = segments[0].to_string();
    let name = repo_name_from_segment(segments[1]);
    if name == UNKNOWN_REPO {
        return Err(invalid("URL must name an owner and a repository"));
    }

    Ok(RemoteRepo {
        clone_url: format!("https://{host}/{owner}/{name}"),
        owner,
        name,
    })
}

pub const UNKNOWN_REPO: &str = "unknown-repo";

fn repo_name_from_segment(segment: &str) -> String {
    let name = segment.trim_end_matches(".git").trim_matches('/');
    if name.is_empty() {
        UNKNOWN_REPO.to_string()
    } else {
        name.to_string()
    }
}

/// Depth-1 clone of `repo` into `target`, which must be empty or absent.
pub fn shallow_clone(repo: &RemoteRepo, target: &Path, token: Option<&str>) -> Result<(), AppError> {
    tracing::info!("Cloning {} into {}", repo.clone_url, target.display());

    let mut fetch = FetchOptions::new();
    fetch.depth(1);
    if let Some(token) = token {
        let token = token.to_string();
        let mut callbacks = RemoteCallbacks::new();
        callbacks.credentials(move |_url, _username, _allowed| {
            Cred::userpass_plaintext("x-access-token", &token)
        });
        fetch.remote_callbacks(callbacks);
    }

    RepoBuilder::new()
        .fetch_options(fetch)
        .clone(&repo.clone_url, target)
        .map_err(|e| {
            AppError::AcquisitionFailed(format!("failed to clone {}: {}", repo.clone_url, e.message()))
        })?;

    tracing::info!("Clone complete: {}", target.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_urls() {
        let repo = validate_remote_url("https://github.com/rust-lang/cargo", "github.com").unwrap();
        assert_eq!(repo.clone_url, "https://github.com/rust-lang/cargo");
        assert_eq!(repo.owner, "rust-lang");
        assert_eq!(repo.name, "cargo");

        let repo =
            validate_remote_url("  https://GitHub.com/tokio-rs/axum.git/  ", "github.com").unwrap();
        assert_eq!(repo.name, "axum");
        assert_eq!(repo.clone_url, "https://github.com/tokio-rs/axum");

        let repo = validate_remote_url(
            "https://github.com/serde-rs/serde/tree/master/serde?tab=readme",
            "github.com",
        )
        .unwrap();
        assert_eq!(repo.clone_url, "https://github.com/serde-rs/serde");
    }

    #[test]
    fn test_invalid_urls() {
        for raw in [
            "not a url",
            "http://github.com/owner/repo",
            "git@github.com:owner/repo.git",
            "https://gitlab.com/owner/repo",
            "https://github.com/",
            "https://github.com/owner",
            "https://github.com//owner",
            "https://github.com/owner/.git",
            "file:///etc/passwd",
        ] {
            let err = validate_remote_url(raw, "github.com").unwrap_err();
            assert!(matches!(err, AppError::InvalidSource(_)), "{raw} should be rejected");
        }
    }

    #[test]
    fn test_clone_failure_is_acquisition_failed() {
        let dir = tempfile::TempDir::new().unwrap();
        let repo = RemoteRepo {
            clone_url: "https://127.0.0.1:1/nobody/nothing".to_string(),
            owner: "nobody".to_string(),
            name: "nothing".to_string(),
        };
        let err = shallow_clone(&repo, &dir.path().join("clone"), None).unwrap_err();
        assert!(matches!(err, AppError::AcquisitionFailed(_)));
    }
}
