use crate::config::SelectorConfig;
use crate::models::FileChunk;

/// Occurrences of one token counted per chunk, so a single keyword cannot dominate.
const MAX_MATCHES_PER_TOKEN: usize = 5;
/// A token found in the file path is worth more than one found in the content.
const PATH_MATCH_WEIGHT: usize = 3;
/// Added when the whole question appears verbatim in the chunk.
const EXACT_PHRASE_BONUS: usize = 10;

/// A chunk paired with its score for the current question.
#[derive(Debug, Clone, Copy)]
pub struct ScoredChunk<'a> {
    pub chunk: &'a FileChunk,
    pub score: usize,
}

/// Lowercase alphanumeric words (underscores kept) of at least two chars.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'))
        .filter(|w| w.len() >= 2)
        .map(str::to_string)
        .collect()
}

/// Keyword-overlap score of one chunk.
pub fn score_chunk(chunk: &FileChunk, tokens: &[String], raw_question: &str) -> usize {
    let content = chunk.content.to_lowercase();
    let path = chunk.file_path.to_lowercase();

    let mut score = 0;
    for token in tokens {
        score += content.matches(token.as_str()).count().min(MAX_MATCHES_PER_TOKEN);
        if path.contains(token.as_str()) {
            score += PATH_MATCH_WEIGHT;
        }
    }

    let phrase = raw_question.trim().to_lowercase();
    if phrase.chars().count() > 3 && content.contains(&phrase) {
        score += EXACT_PHRASE_BONUS;
    }

    score
}

/// Score every chunk and order them best first.
///
/// Ties are broken by file path, then chunk index, so identical inputs
/// always produce the same order.
pub fn rank_chunks<'a>(chunks: &'a [FileChunk], question: &str) -> Vec<ScoredChunk<'a>> {
    let tokens = tokenize(question);
    let mut scored: Vec<ScoredChunk<'a>> = chunks
        .iter()
        .map(|chunk| ScoredChunk {
            chunk,
            score: score_chunk(chunk, &tokens, question),
        })
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.chunk.file_path.cmp(&b.chunk.file_path))
            .then_with(|| a.chunk.chunk_index.cmp(&b.chunk.chunk_index))
    });
    scored
}

/// Pick the context for one question.
///
/// Walks the ranked list until the chunk cap or the character budget is hit.
/// Zero-score chunks are only taken while fewer than
/// `min_context_chunks` have been accepted, so even questions with no keyword
/// overlap get some context.
pub fn select_relevant_chunks(
    chunks: &[FileChunk],
    question: &str,
    limits: &SelectorConfig,
) -> Vec<FileChunk> {
    let mut selected = Vec::new();
    let mut total_chars = 0usize;

    for ScoredChunk { chunk, score } in rank_chunks(chunks, question) {
        if selected.len() >= limits.max_chunks {
            break;
        }
        let chars = chunk.content.chars().count();
        if total_chars + chars > limits.max_chars {
            break;
        }
        if score == 0 && selected.len() >= limits.min_context_chunks {
            break;
        }

        total_chars += chars;
        selected.push(chunk.clone());
    }

    selected
}
