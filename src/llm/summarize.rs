use std::collections::HashMap;

use chrono::Utc;
use futures_util::stream::{self, StreamExt};
use regex::Regex;
use uuid::Uuid;

use crate::config::SummaryConfig;
use crate::llm::backend::GenerationParams;
use crate::llm::cascade::ModelCascade;
use crate::models::{FileChunk, FileSummary, RepoSummary};

pub const SUMMARY_PARAMS: GenerationParams = GenerationParams::new(0.3, 2048);

/// A file reassembled from its chunks.
#[derive(Debug)]
struct FileGroup<'a> {
    path: &'a str,
    language: &'a str,
    chunks: Vec<&'a str>,
}

impl FileGroup<'_> {
    fn chars(&self) -> usize {
        self.chunks.iter().map(|c| c.chars().count()).sum()
    }
}

/// Regroup a chunk pool by file, keeping the order files are first seen.
fn group_by_file(chunks: &[FileChunk]) -> Vec<FileGroup<'_>> {
    let mut groups: Vec<FileGroup<'_>> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for chunk in chunks {
        let slot = *index.entry(chunk.file_path.as_str()).or_insert_with(|| {
            groups.push(FileGroup {
                path: &chunk.file_path,
                language: &chunk.language,
                chunks: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].chunks.push(&chunk.content);
    }

    groups
}

/// Split groups into batches bounded by file count and total characters.
/// A single file larger than the character cap still gets its own batch.
fn plan_batches<'a, 'b>(
    groups: &'b [FileGroup<'a>],
    config: &SummaryConfig,
) -> Vec<&'b [FileGroup<'a>]> {
    let max_files = config.batch_files.max(1);
    let mut batches = Vec::new();
    let mut start = 0;
    let mut chars = 0;

    for (i, group) in groups.iter().enumerate() {
        let group_chars = group.chars();
        let count = i - start;
        if count >= max_files || (count > 0 && chars + group_chars > config.batch_chars) {
            batches.push(&groups[start..i]);
            start = i;
            chars = 0;
        }
        chars += group_chars;
    }
    if start < groups.len() {
        batches.push(&groups[start..]);
    }

    batches
}

fn batch_prompt(batch: &[FileGroup<'_>]) -> String {
    let blocks = batch
        .iter()
        .map(|f| {
            format!(
                "### File: {} ({})\n```{}\n{}\n```",
                f.path,
                f.language,
                f.language,
                f.chunks.join("\n")
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "You are a senior software engineer analysing a codebase.\n\n\
         For EACH file below, produce a concise technical summary (2-4 sentences).\n\
         Focus on: purpose, key exports/functions, dependencies, and patterns used.\n\n\
         Return your answer as a numbered list in this exact format (one entry per file, no extra text):\n\
         1. **<file path>**: <summary>\n\
         2. **<file path>**: <summary>\n\
         ...\n\n\
         {blocks}"
    )
}

fn default_file_summary(path: &str) -> String {
    format!("Source file at {path}")
}

/// Path and language of one file in a batch.
#[derive(Debug, Clone)]
struct BatchFile {
    path: String,
    language: String,
}

/// Everything one batch call needs, detached from the chunk pool so the
/// batches can run side by side.
#[derive(Debug)]
struct BatchRequest {
    prompt: String,
    fallback: String,
    files: Vec<BatchFile>,
}

impl BatchRequest {
    fn new(batch: &[FileGroup<'_>]) -> Self {
        let fallback = batch
            .iter()
            .map(|f| format!("**{}**: {}", f.path, default_file_summary(f.path)))
            .collect::<Vec<_>>()
            .join("\n");
        let files = batch
            .iter()
            .map(|f| BatchFile {
                path: f.path.to_string(),
                language: f.language.to_string(),
            })
            .collect();

        Self {
            prompt: batch_prompt(batch),
            fallback,
            files,
        }
    }
}

/// Pull one summary per file out of a numbered-list response.
fn parse_batch_response(raw: &str, files: &[BatchFile]) -> Vec<FileSummary> {
    files
        .iter()
        .map(|file| {
            let pattern = format!(r"(?i)\*\*{}\*\*:\s*(.+)", regex::escape(&file.path));
            let summary = Regex::new(&pattern)
                .ok()
                .and_then(|re| re.captures(raw))
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| default_file_summary(&file.path));

            FileSummary {
                file_path: file.path.clone(),
                language: file.language.clone(),
                summary,
            }
        })
        .collect()
}

async fn summarize_batch(cascade: ModelCascade, request: BatchRequest) -> Vec<FileSummary> {
    let generation = cascade
        .generate(&request.prompt, &request.fallback, &SUMMARY_PARAMS)
        .await;
    parse_batch_response(&generation.text, &request.files)
}

fn overview_prompt(repo_name: &str, summaries: &[FileSummary]) -> String {
    let listing = summaries
        .iter()
        .map(|s| format!("- **{}** ({}): {}", s.file_path, s.language, s.summary))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are a senior software architect analysing a repository named \"{repo_name}\".\n\n\
         Below is a list of files and their summaries:\n\n\
         {listing}\n\n\
         Provide a concise project overview in 3-5 sentences. Cover:\n\
         - What the project does\n\
         - The primary language(s) and framework(s)\n\
         - How the code is organised (major modules/layers)\n\n\
         Be technical but clear. Do not list individual files."
    )
}

fn architecture_prompt(repo_name: &str, summaries: &[FileSummary]) -> String {
    let listing = summaries
        .iter()
        .map(|s| format!("- {} ({}): {}", s.file_path, s.language, s.summary))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are a senior software architect analysing the architecture of \"{repo_name}\".\n\n\
         File summaries:\n\
         {listing}\n\n\
         Produce a concise architecture overview (4-8 sentences) covering:\n\
         - System layers (frontend, backend, data, infrastructure)\n\
         - Key design patterns (MVC, microservices, event-driven, etc.)\n\
         - Data flow between major components\n\
         - Entry points and external interfaces\n\n\
         Be specific to this codebase. Do not list every file."
    )
}

/// Per-file summaries, a project overview and an architecture description.
///
/// Never fails: every backend call goes through the cascade, and each piece
/// has its own fallback text.
pub async fn summarize_repo(
    cascade: &ModelCascade,
    repo_id: Uuid,
    repo_name: &str,
    chunks: &[FileChunk],
    config: &SummaryConfig,
) -> RepoSummary {
    let groups = group_by_file(chunks);
    let file_count = groups.len();
    let requests: Vec<BatchRequest> = plan_batches(&groups, config)
        .into_iter()
        .map(BatchRequest::new)
        .collect();
    tracing::info!(
        "Summarizing {file_count} files of {repo_name} in {} batches",
        requests.len()
    );

    let file_summaries: Vec<FileSummary> = stream::iter(requests)
        .map(|request| summarize_batch(cascade.clone(), request))
        .buffered(config.concurrency.max(1))
        .collect::<Vec<_>>()
        .await
        .into_iter()
        .flatten()
        .collect();

    let limited = &file_summaries[..file_summaries.len().min(config.overview_limit)];
    let overview_fallback = format!("{repo_name} is a software project with {file_count} source files.");
    let architecture_fallback = format!("The architecture of {repo_name} could not be determined.");
    let overview_request = overview_prompt(repo_name, limited);
    let architecture_request = architecture_prompt(repo_name, limited);

    let (overview, architecture) = tokio::join!(
        cascade.generate(&overview_request, &overview_fallback, &SUMMARY_PARAMS),
        cascade.generate(&architecture_request, &architecture_fallback, &SUMMARY_PARAMS),
    );

    RepoSummary {
        repo_id,
        overview: overview.text,
        architecture: architecture.text,
        file_summaries,
        generated_at: Utc::now(),
    }
}
