//! # repo-chat
//!
//! A Rust web service that ingests a source repository (GitHub URL, ZIP
//! archive or pasted snippet), cuts its text into bounded chunks and answers
//! questions about the code by handing the most relevant chunks to a
//! generative model.
//!
//! ## Architecture
//!
//! Ingestion and question answering are two independent flows that meet at
//! the in-memory store:
//!
//! ```text
//!   ┌──────────────────┐
//!   │ GitHub URL / ZIP │
//!   │   / pasted text  │
//!   └────────┬─────────┘
//!            ▼
//!   ┌──────────────────┐     fresh <root>/<uuid> dir,
//!   │     Acquire      │     removed on every exit path
//!   └────────┬─────────┘
//!            ▼
//!   ┌──────────────────┐     ignored dirs, binary and
//!   │  Walk + Filter   │     oversized files skipped
//!   └────────┬─────────┘
//!            ▼
//!   ┌──────────────────┐     ≤ 1500 chars, split at
//!   │      Chunk       │     boundaries after 1200
//!   └────────┬─────────┘
//!            ▼
//!   ┌──────────────────┐     batched per-file summaries,
//!   │    Summarize     │     overview + architecture
//!   └────────┬─────────┘
//!            ▼
//!   ┌──────────────────┐     TTL 1h, 50 entries,
//!   │      Store       │◄─── evicted on save / read
//!   └────────┬─────────┘
//!            │  later, per question
//!            ▼
//!   ┌──────────────────┐
//!   │    Rule tier     │──── match ──► canned answer ("rule-based")
//!   └────────┬─────────┘
//!            │ no match
//!            ▼
//!   ┌──────────────────┐     keyword + path score,
//!   │ Select relevant  │     ≤ 30 chunks / 60k chars
//!   └────────┬─────────┘
//!            ▼
//!   ┌──────────────────┐     models in order, retries with
//!   │  Model cascade   │     doubling backoff, fallback text
//!   └──────────────────┘
//! ```
//!
//! ## Module Overview
//!
//! - [`config`] - Environment-based configuration
//! - [`error`] - `AppError` and its HTTP status mapping
//! - [`models`] - Shared data types: `ParsedFile`, `FileChunk`, `RepoSummary`, request/response types
//! - [`acquire`] - Shallow clone, safe ZIP extraction, text snippets, guarded cleanup
//! - [`files`] - Directory walk, file filters and language detection
//! - [`chunking`] - Boundary-aware chunker
//! - [`search`] - Keyword relevance scoring and context selection
//! - [`llm`] - Generative backends, the retrying model cascade and summarization
//! - [`answer`] - Rule table and the answering engine
//! - [`store`] - Bounded in-memory repository store
//! - [`pipeline`] - End-to-end ingestion
//! - [`api`] - Axum HTTP handlers
//! - [`state`] - Shared application state

pub mod acquire;
pub mod answer;
pub mod api;
pub mod chunking;
pub mod config;
pub mod error;
pub mod files;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod search;
pub mod state;
pub mod store;
