//! Keyword relevance scoring and context selection.

pub mod relevance;

pub use relevance::{rank_chunks, score_chunk, select_relevant_chunks, tokenize, ScoredChunk};
