use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use uuid::Uuid;

/// Where an ingested repository came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    RemoteUrl,
    Archive,
    Text,
}

/// One ingested repository on local disk.
///
/// The directory under `local_path` belongs to the pipeline run that created
/// it and is removed once processing completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryHandle {
    pub id: Uuid,
    pub name: String,
    pub local_path: PathBuf,
}

/// A text file read from disk by the walker.
#[derive(Debug, Clone)]
pub struct ParsedFile {
    /// Path relative to the repository root, `/`-separated.
    pub path: String,
    /// Lowercased extension including the leading dot, or empty.
    pub extension: String,
    pub language: String,
    pub content: String,
    pub size_bytes: u64,
}

/// A bounded slice of one file's text
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileChunk {
    pub file_path: String,
    pub chunk_index: usize,
    pub language: String,
    pub content: String,
    /// 1-based first line covered by this chunk.
    pub start_line: usize,
    /// 1-based last line covered by this chunk.
    pub end_line: usize,
}

/// Generated summary for a single file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileSummary {
    pub file_path: String,
    pub language: String,
    pub summary: String,
}

/// Generated summary for a whole repository
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoSummary {
    pub repo_id: Uuid,
    pub overview: String,
    pub architecture: String,
    pub file_summaries: Vec<FileSummary>,
    pub generated_at: DateTime<Utc>,
}

/// Label saying which tier produced an answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provenance {
    /// Canned answer from the rule table; no backend call was made.
    RuleBased,
    /// Text generated by the named model.
    Model(String),
    /// Every model failed and the static fallback text was returned.
    Fallback,
}

impl Provenance {
    pub const RULE_BASED: &'static str = "rule-based";
    pub const FALLBACK: &'static str = "fallback";

    pub fn as_str(&self) -> &str {
        match self {
            Provenance::RuleBased => Self::RULE_BASED,
            Provenance::Model(name) => name,
            Provenance::Fallback => Self::FALLBACK,
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Provenance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Upload request (JSON body): either a remote URL or pasted text.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadRequest {
    pub github_url: Option<String>,
    pub text: Option<String>,
    pub name: Option<String>,
}

/// Query string for raw archive uploads
#[derive(Debug, Clone, Deserialize)]
pub struct ArchiveUploadQuery {
    pub name: Option<String>,
}

/// Result of a completed ingestion
#[derive(Debug, Clone, Serialize)]
pub struct UploadResult {
    pub repo_id: Uuid,
    pub repo_name: String,
    pub source: SourceKind,
    pub file_count: usize,
    pub chunk_count: usize,
    pub files: Vec<String>,
    pub repo_summary: String,
    pub architecture: String,
}

/// Repository chat request
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub repo_id: String,
    pub question: String,
}

/// Repository chat response
#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    pub repo_id: String,
    pub question: String,
    pub answer: String,
    pub chunks_used: usize,
    pub model_used: Provenance,
}

/// General assistant request
#[derive(Debug, Clone, Deserialize)]
pub struct AssistantRequest {
    pub question: String,
}

/// General assistant response
#[derive(Debug, Clone, Serialize)]
pub struct AssistantResponse {
    pub question: String,
    pub answer: String,
    pub model_used: Provenance,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provenance_serializes_as_plain_string() {
        assert_eq!(
            serde_json::to_value(Provenance::RuleBased).unwrap(),
            "rule-based"
        );
        assert_eq!(serde_json::to_value(Provenance::Fallback).unwrap(), "fallback");
        assert_eq!(
            serde_json::to_value(Provenance::Model("gemini-2.0-flash".into())).unwrap(),
            "gemini-2.0-flash"
        );
    }

    #[test]
    fn test_source_kind_serializes_to_snake_case() {
        let json = serde_json::to_value(SourceKind::RemoteUrl).unwrap();
        assert_eq!(json, "remote_url");
    }
}
