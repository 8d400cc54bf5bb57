//! Getting repository content onto local disk.
//!
//! Every repository lands in a fresh `<root>/<uuid>` directory. The directory
//! belongs to whoever allocated it and must be released with
//! [`Workspace::cleanup`] (or a [`CleanupGuard`]) once processing is over.

pub mod archive;
pub mod clone;

use std::path::{Component, Path, PathBuf};

use uuid::Uuid;

use crate::config::AcquireConfig;
use crate::error::AppError;
use crate::models::{RepositoryHandle, SourceKind};

pub use archive::extract_archive;
pub use clone::{shallow_clone, validate_remote_url, RemoteRepo, UNKNOWN_REPO};

pub const DEFAULT_TEXT_NAME: &str = "text-upload";

/// What to ingest.
#[derive(Debug, Clone)]
pub enum Source {
    RemoteUrl(String),
    Archive {
        bytes: Vec<u8>,
        /// Uploaded file name; must end in `.zip`.
        file_name: Option<String>,
    },
    Text {
        text: String,
        name: Option<String>,
    },
}

impl Source {
    pub fn kind(&self) -> SourceKind {
        match self {
            Source::RemoteUrl(_) => SourceKind::RemoteUrl,
            Source::Archive { .. } => SourceKind::Archive,
            Source::Text { .. } => SourceKind::Text,
        }
    }
}

/// Owner of the dedicated repository root.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
    allowed_host: String,
    git_token: Option<String>,
}

impl Workspace {
    /// Create the root if needed. The stored root is canonical so later
    /// containment checks compare like with like.
    pub fn new(root: impl AsRef<Path>, config: &AcquireConfig) -> Result<Self, AppError> {
        std::fs::create_dir_all(root.as_ref())?;
        Ok(Self {
            root: root.as_ref().canonicalize()?,
            allowed_host: config.allowed_host.clone(),
            git_token: config.git_token.clone(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Human-readable name for a source. Validates remote URLs and archive
    /// file names, so call this before allocating anything.
    pub fn source_name(&self, source: &Source) -> Result<String, AppError> {
        match source {
            Source::RemoteUrl(url) => Ok(validate_remote_url(url, &self.allowed_host)?.name),
            Source::Archive { file_name, .. } => {
                let file_name = file_name.as_deref().unwrap_or("upload.zip").trim();
                archive_name(file_name).ok_or_else(|| {
                    AppError::InvalidSource(format!("only .zip files are accepted: {file_name}"))
                })
            }
            Source::Text { text, name } => {
                if text.trim().is_empty() {
                    return Err(AppError::InvalidSource("text upload is empty".to_string()));
                }
                Ok(name
                    .as_deref()
                    .map(str::trim)
                    .filter(|n| !n.is_empty())
                    .unwrap_or(DEFAULT_TEXT_NAME)
                    .to_string())
            }
        }
    }

    /// Create a fresh, empty directory for one repository.
    pub fn allocate(&self, name: &str) -> Result<RepositoryHandle, AppError> {
        let id = Uuid::new_v4();
        let local_path = self.root.join(id.to_string());
        std::fs::create_dir(&local_path)?;
        Ok(RepositoryHandle {
            id,
            name: name.to_string(),
            local_path,
        })
    }

    /// Fill an allocated directory from `source`. Blocking.
    pub fn populate(&self, handle: &RepositoryHandle, source: &Source) -> Result<(), AppError> {
        match source {
            Source::RemoteUrl(url) => {
                let repo = validate_remote_url(url, &self.allowed_host)?;
                shallow_clone(&repo, &handle.local_path, self.git_token.as_deref())
            }
            Source::Archive { bytes, .. } => extract_archive(bytes, &handle.local_path).map(|_| ()),
            Source::Text { text, .. } => write_text_project(text, &handle.local_path).map(|_| ()),
        }
    }

    /// Validate, allocate and populate in one go. Blocking.
    ///
    /// If populating fails the partially written directory is removed before
    /// the error is returned; on success the caller owns the directory.
    pub fn acquire(&self, source: &Source) -> Result<RepositoryHandle, AppError> {
        let name = self.source_name(source)?;
        let handle = self.allocate(&name)?;
        if let Err(e) = self.populate(&handle, source) {
            if let Err(cleanup_err) = self.cleanup(&handle.local_path) {
                tracing::warn!("Cleanup after failed acquisition also failed: {cleanup_err}");
            }
            return Err(e);
        }
        tracing::info!("Acquired {} ({}) at {}", handle.name, handle.id, handle.local_path.display());
        Ok(handle)
    }

    /// Recursively delete a repository directory.
    ///
    /// Idempotent: a path that no longer exists is fine. Refuses the root
    /// itself and anything that is not under it, both as written and after
    /// resolving symlinks.
    pub fn cleanup(&self, path: &Path) -> Result<(), AppError> {
        let lexical = lexical_normalize(path);
        if !self.is_strictly_inside(&lexical) {
            return Err(AppError::OutsideWorkspace(path.to_path_buf()));
        }
        let (Some(parent), Some(name)) = (lexical.parent(), lexical.file_name()) else {
            return Err(AppError::OutsideWorkspace(path.to_path_buf()));
        };

        // Resolve every component but the last, so a symlinked directory on
        // the way cannot lead outside the root.
        let resolved = match parent.canonicalize() {
            Ok(parent) => parent.join(name),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        if !self.is_strictly_inside(&resolved) {
            tracing::warn!(
                target: "security",
                "Refusing cleanup of {}, resolves to {}",
                path.display(),
                resolved.display()
            );
            return Err(AppError::OutsideWorkspace(path.to_path_buf()));
        }

        let meta = match std::fs::symlink_metadata(&resolved) {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        // The last component is removed as a link; it is never followed
        if meta.file_type().is_symlink() || meta.is_file() {
            std::fs::remove_file(&resolved)?;
        } else {
            std::fs::remove_dir_all(&resolved)?;
        }
        tracing::debug!("Removed {}", resolved.display());
        Ok(())
    }

    /// Guard that cleans up `handle`'s directory when dropped.
    pub fn guard(&self, handle: &RepositoryHandle) -> CleanupGuard {
        CleanupGuard {
            workspace: self.clone(),
            path: handle.local_path.clone(),
        }
    }

    fn is_strictly_inside(&self, path: &Path) -> bool {
        path.starts_with(&self.root) && path != self.root
    }
}

/// Removes a repository directory on drop, on every exit path.
#[derive(Debug)]
pub struct CleanupGuard {
    workspace: Workspace,
    path: PathBuf,
}

impl CleanupGuard {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        if let Err(e) = self.workspace.cleanup(&self.path) {
            tracing::warn!("Failed to clean up {}: {e}", self.path.display());
        }
    }
}

/// `name.zip` → `name`; `None` for anything that is not a zip file name.
fn archive_name(file_name: &str) -> Option<String> {
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    let split = base.len().checked_sub(4)?;
    let (stem, ext) = (base.get(..split)?, base.get(split..)?);
    if !ext.eq_ignore_ascii_case(".zip") {
        return None;
    }
    Some(if stem.is_empty() {
        UNKNOWN_REPO.to_string()
    } else {
        stem.to_string()
    })
}

/// Resolve `.` and `..` without touching the filesystem.
fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

/// File extension for a pasted snippet, guessed from telltale keywords.
pub fn guess_extension(text: &str) -> &'static str {
    if text.contains("function ") || text.contains("const ") || text.contains("import ") {
        ".js"
    } else if text.contains("def ") {
        ".py"
    } else if text.contains("package ") || text.contains("func ") {
        ".go"
    } else if text.contains("class ") && text.contains("public ") {
        ".java"
    } else {
        ".txt"
    }
}

/// Write a pasted snippet as `main.<ext>` into `target`.
pub fn write_text_project(text: &str, target: &Path) -> Result<PathBuf, AppError> {
    let path = target.join(format!("main{}", guess_extension(text)));
    std::fs::write(&path, text)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn workspace(dir: &TempDir) -> Workspace {
        Workspace::new(dir.path().join("repos"), &AcquireConfig::default()).unwrap()
    }

    #[test]
    fn test_allocate_creates_unique_dirs_under_root() {
        let dir = TempDir::new().unwrap();
        let ws = workspace(&dir);

        let a = ws.allocate("a").unwrap();
        let b = ws.allocate("b").unwrap();
        assert_ne!(a.local_path, b.local_path);
        assert!(a.local_path.is_dir());
        assert!(a.local_path.starts_with(ws.root()));
    }

    #[test]
    fn test_source_names() {
        let dir = TempDir::new().unwrap();
        let ws = workspace(&dir);

        let remote = Source::RemoteUrl("https://github.com/owner/widget.git".into());
        assert_eq!(ws.source_name(&remote).unwrap(), "widget");

        let zip = Source::Archive {
            bytes: Vec::new(),
            file_name: Some("project-main.ZIP".into()),
        };
        assert_eq!(ws.source_name(&zip).unwrap(), "project-main");

        let unnamed = Source::Archive {
            bytes: Vec::new(),
            file_name: None,
        };
        assert_eq!(ws.source_name(&unnamed).unwrap(), "upload");

        let text = Source::Text {
            text: "print(1)".into(),
            name: None,
        };
        assert_eq!(ws.source_name(&text).unwrap(), DEFAULT_TEXT_NAME);
    }

    #[test]
    fn test_source_name_rejects_bad_input() {
        let dir = TempDir::new().unwrap();
        let ws = workspace(&dir);

        for source in [
            Source::RemoteUrl("https://example.com/owner/repo".into()),
            Source::Archive {
                bytes: Vec::new(),
                file_name: Some("project.tar.gz".into()),
            },
            Source::Text {
                text: "   ".into(),
                name: None,
            },
        ] {
            assert!(matches!(ws.source_name(&source), Err(AppError::InvalidSource(_))));
        }
    }

    #[test]
    fn test_guess_extension() {
        assert_eq!(guess_extension("const x = 1;"), ".js");
        assert_eq!(guess_extension("def main():\n    pass"), ".py");
        assert_eq!(guess_extension("package main\nfunc main() {}"), ".go");
        assert_eq!(guess_extension("public class Main {}"), ".java");
        assert_eq!(guess_extension("just some notes"), ".txt");
    }

    #[test]
    fn test_acquire_text_source() {
        let dir = TempDir::new().unwrap();
        let ws = workspace(&dir);
        let source = Source::Text {
            text: "def hello():\n    return 'hi'\n".into(),
            name: Some("snippet".into()),
        };

        let handle = ws.acquire(&source).unwrap();
        assert_eq!(handle.name, "snippet");
        let content = std::fs::read_to_string(handle.local_path.join("main.py")).unwrap();
        assert!(content.starts_with("def hello()"));
    }

    #[test]
    fn test_failed_acquire_leaves_nothing_behind() {
        let dir = TempDir::new().unwrap();
        let ws = workspace(&dir);
        let source = Source::Archive {
            bytes: b"garbage".to_vec(),
            file_name: Some("broken.zip".into()),
        };

        assert!(matches!(ws.acquire(&source), Err(AppError::InvalidSource(_))));
        assert_eq!(std::fs::read_dir(ws.root()).unwrap().count(), 0);
    }

    #[test]
    fn test_cleanup_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let ws = workspace(&dir);
        let handle = ws.allocate("x").unwrap();
        std::fs::write(handle.local_path.join("f.txt"), "x").unwrap();

        ws.cleanup(&handle.local_path).unwrap();
        assert!(!handle.local_path.exists());
        ws.cleanup(&handle.local_path).unwrap();
    }

    #[test]
    fn test_cleanup_refuses_outside_paths() {
        let dir = TempDir::new().unwrap();
        let ws = workspace(&dir);
        let outside = dir.path().join("precious");
        std::fs::create_dir(&outside).unwrap();

        for path in [
            outside.clone(),
            ws.root().to_path_buf(),
            ws.root().join("..").join("precious"),
            ws.root().join("abc").join("..").join(".."),
        ] {
            assert!(
                matches!(ws.cleanup(&path), Err(AppError::OutsideWorkspace(_))),
                "{} should be refused",
                path.display()
            );
        }
        assert!(outside.exists());
        assert!(ws.root().exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_cleanup_removes_symlink_without_following_it() {
        let dir = TempDir::new().unwrap();
        let ws = workspace(&dir);
        let outside = dir.path().join("precious");
        std::fs::create_dir(&outside).unwrap();
        std::fs::write(outside.join("keep.txt"), "x").unwrap();

        let link = ws.root().join("link");
        std::os::unix::fs::symlink(&outside, &link).unwrap();
        ws.cleanup(&link).unwrap();

        assert!(!link.exists());
        assert!(outside.join("keep.txt").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_cleanup_refuses_paths_through_symlinked_dirs() {
        let dir = TempDir::new().unwrap();
        let ws = workspace(&dir);
        let outside = dir.path().join("precious");
        std::fs::create_dir_all(outside.join("nested")).unwrap();
        std::fs::write(outside.join("keep.txt"), "x").unwrap();

        let link = ws.root().join("link");
        std::os::unix::fs::symlink(&outside, &link).unwrap();

        for path in [link.join("keep.txt"), link.join("nested")] {
            assert!(
                matches!(ws.cleanup(&path), Err(AppError::OutsideWorkspace(_))),
                "{} should be refused",
                path.display()
            );
        }
        assert!(outside.join("keep.txt").exists());
        assert!(outside.join("nested").exists());
    }

    #[test]
    fn test_guard_cleans_up_on_drop() {
        let dir = TempDir::new().unwrap();
        let ws = workspace(&dir);
        let handle = ws.allocate("x").unwrap();
        {
            let guard = ws.guard(&handle);
            assert_eq!(guard.path(), handle.local_path.as_path());
        }
        assert!(!handle.local_path.exists());
    }
}
