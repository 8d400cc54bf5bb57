//! Question answering: the rule tier first, then retrieval plus the model
//! cascade.

pub mod rules;

use std::sync::Arc;

use uuid::Uuid;

use crate::config::SelectorConfig;
use crate::error::AppError;
use crate::llm::{GenerationParams, ModelCascade};
use crate::models::{AssistantResponse, ChatResponse, FileChunk, Provenance};
use crate::search::select_relevant_chunks;
use crate::store::RepoStore;
use rules::{match_rule, Scope};

pub const REPO_CHAT_PARAMS: GenerationParams = GenerationParams::new(0.4, 4096);
pub const ASSISTANT_PARAMS: GenerationParams = GenerationParams::new(0.5, 2048);

pub const REPO_CHAT_FALLBACK: &str =
    "I'm unable to reach the AI service right now. Please try again in a moment.";
pub const ASSISTANT_FALLBACK: &str = "I'm having trouble reaching the AI service right now. \
     Try again in a moment, or ask me how to use the service!";

/// Answers general and repository-scoped questions.
#[derive(Clone)]
pub struct AnswerEngine {
    cascade: ModelCascade,
    store: Arc<dyn RepoStore>,
    selector: SelectorConfig,
}

impl AnswerEngine {
    pub fn new(cascade: ModelCascade, store: Arc<dyn RepoStore>, selector: SelectorConfig) -> Self {
        Self {
            cascade,
            store,
            selector,
        }
    }

    /// Answer a question that is not about any repository. Never fails.
    pub async fn answer_general(&self, question: &str) -> AssistantResponse {
        if let Some(hit) = match_rule(question, Scope::Assistant) {
            return AssistantResponse {
                question: question.to_string(),
                answer: hit.answer.to_string(),
                model_used: Provenance::RuleBased,
            };
        }

        let prompt = assistant_prompt(question.trim());
        let generation = self
            .cascade
            .generate(&prompt, ASSISTANT_FALLBACK, &ASSISTANT_PARAMS)
            .await;
        tracing::info!("Assistant answered via {}", generation.provenance);

        AssistantResponse {
            question: question.to_string(),
            answer: generation.text,
            model_used: generation.provenance,
        }
    }

    /// Answer a question about an ingested repository.
    ///
    /// Fails only with [`AppError::RepositoryNotFound`] when the id is
    /// unknown, malformed or expired. Backend failures become a fallback answer.
    pub async fn answer_for_repo(&self, repo_id: &str, question: &str) -> Result<ChatResponse, AppError> {
        let chunks = Uuid::parse_str(repo_id.trim())
            .ok()
            .and_then(|id| self.store.get_chunks(&id))
            .ok_or_else(|| AppError::RepositoryNotFound(repo_id.to_string()))?;

        if let Some(hit) = match_rule(question, Scope::Conversation) {
            return Ok(ChatResponse {
                repo_id: repo_id.to_string(),
                question: question.to_string(),
                answer: hit.answer.to_string(),
                chunks_used: 0,
                model_used: Provenance::RuleBased,
            });
        }

        let relevant = select_relevant_chunks(&chunks, question, &self.selector);
        tracing::info!(
            "Selected {} of {} chunks for repo {repo_id}",
            relevant.len(),
            chunks.len()
        );

        let prompt = repo_prompt(question.trim(), &relevant);
        let generation = self
            .cascade
            .generate(&prompt, REPO_CHAT_FALLBACK, &REPO_CHAT_PARAMS)
            .await;

        Ok(ChatResponse {
            repo_id: repo_id.to_string(),
            question: question.to_string(),
            answer: generation.text,
            chunks_used: relevant.len(),
            model_used: generation.provenance,
        })
    }
}

fn repo_prompt(question: &str, context: &[FileChunk]) -> String {
    let blocks = context
        .iter()
        .map(|c| {
            format!(
                "### {} (chunk {}, {})\n```{}\n{}\n```",
                c.file_path, c.chunk_index, c.language, c.language, c.content
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "You are an expert software engineer helping a developer understand a codebase.\n\n\
         You have access to the following source code excerpts from the repository:\n\n\
         {blocks}\n\n\
         ---\n\n\
         The developer asks:\n\
         \"{question}\"\n\n\
         Provide a clear, technically accurate answer based ONLY on the code shown above.\n\
         - Reference specific file paths and function/class names when relevant.\n\
         - If the code above does not contain enough information to fully answer, say so honestly.\n\
         - Use markdown formatting for readability.\n\
         - Be concise but thorough."
    )
}

fn assistant_prompt(question: &str) -> String {
    format!(
        "You are a code assistant for a repository analysis service. You always speak in \
         first person (\"I\", \"me\", \"my\").\n\n\
         You help developers:\n\
         - Ingest GitHub repositories, ZIP archives or pasted snippets\n\
         - Read generated summaries and architecture overviews of what they ingested\n\
         - Ask questions about their code and get answers that cite specific files\n\n\
         Rules:\n\
         - Always speak in first person. Say \"I help you...\", never \"the system...\"\n\
         - Never name the model provider you run on\n\n\
         The user asks:\n\
         \"{question}\"\n\n\
         Provide a helpful, concise answer. Use markdown formatting. Be friendly and informative.\n\
         If the question is about something completely unrelated, you can still answer as a \
         general-purpose assistant."
    )
}
