use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::LlmConfig;

/// Sampling parameters for one generation call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl GenerationParams {
    pub const fn new(temperature: f32, max_output_tokens: u32) -> Self {
        Self {
            temperature,
            max_output_tokens,
        }
    }
}

/// Failure of a single backend call.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("invalid credentials: {0}")]
    Unauthorized(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("could not decode backend response: {0}")]
    Decode(String),

    #[error("backend returned empty text")]
    Empty,

    #[error("unsupported LLM provider: {0}")]
    Unsupported(String),
}

impl BackendError {
    /// Credential and configuration errors fail identically on every model,
    /// so the cascade stops on them instead of retrying.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            BackendError::Unauthorized(_)
                | BackendError::PermissionDenied(_)
                | BackendError::Unsupported(_)
        )
    }
}

/// A text generation service addressed by model name.
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, BackendError>;
}

/// HTTP backend speaking the Gemini, OpenAI-compatible or Ollama protocol.
pub struct HttpBackend {
    client: reqwest::Client,
    config: LlmConfig,
}

impl HttpBackend {
    pub fn new(client: reqwest::Client, config: LlmConfig) -> Self {
        Self { client, config }
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout_secs)
    }

    fn api_key(&self) -> Result<&str, BackendError> {
        match self.config.api_key.as_deref() {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(BackendError::Unauthorized(format!(
                "no API key configured for provider {}",
                self.config.provider
            ))),
        }
    }
}

#[async_trait]
impl GenerativeBackend for HttpBackend {
    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, BackendError> {
        match self.config.provider.as_str() {
            "gemini" => self.call_gemini(model, prompt, params).await,
            "openai" => self.call_openai(model, prompt, params).await,
            "ollama" => self.call_ollama(model, prompt, params).await,
            other => Err(BackendError::Unsupported(other.to_string())),
        }
    }
}

/// Turn a non-success response into the matching error.
async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, BackendError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    Err(match status {
        StatusCode::UNAUTHORIZED => BackendError::Unauthorized(body),
        StatusCode::FORBIDDEN => BackendError::PermissionDenied(body),
        // Gemini reports a bad key as 400 with this reason
        StatusCode::BAD_REQUEST if body.contains("API_KEY_INVALID") => {
            BackendError::Unauthorized(body)
        }
        _ => BackendError::Status {
            status: status.as_u16(),
            body,
        },
    })
}

fn transport(e: reqwest::Error) -> BackendError {
    BackendError::Transport(format!("{e:#}"))
}

fn decode(e: reqwest::Error) -> BackendError {
    BackendError::Decode(format!("{e:#}"))
}

// ─── Gemini ──────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

impl HttpBackend {
    async fn call_gemini(
        &self,
        model: &str,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, BackendError> {
        let api_key = self.api_key()?;
        let url = format!(
            "{}/v1beta/models/{model}:generateContent",
            self.config.base_url
        );

        let req = GeminiRequest {
            contents: vec![GeminiContent {
                role: Some("user".to_string()),
                parts: vec![GeminiPart {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GeminiGenerationConfig {
                temperature: params.temperature,
                max_output_tokens: params.max_output_tokens,
            },
        };

        let resp = self
            .client
            .post(&url)
            .timeout(self.timeout())
            .header("x-goog-api-key", api_key)
            .json(&req)
            .send()
            .await
            .map_err(transport)?;
        let resp = check_status(resp).await?;

        let body: GeminiResponse = resp.json().await.map_err(decode)?;
        Ok(body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<String>()
            })
            .unwrap_or_default())
    }
}

// ─── OpenAI-compatible ───────────────────────────────────

#[derive(Serialize)]
struct OpenAiChatRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct OpenAiChatResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
}

#[derive(Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
}

impl HttpBackend {
    async fn call_openai(
        &self,
        model: &str,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, BackendError> {
        let api_key = self.api_key()?;
        let url = format!("{}/v1/chat/completions", self.config.base_url);

        let req = OpenAiChatRequest {
            model: model.to_string(),
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: params.temperature,
            max_tokens: params.max_output_tokens,
        };

        let resp = self
            .client
            .post(&url)
            .timeout(self.timeout())
            .header("Authorization", format!("Bearer {api_key}"))
            .json(&req)
            .send()
            .await
            .map_err(transport)?;
        let resp = check_status(resp).await?;

        let body: OpenAiChatResponse = resp.json().await.map_err(decode)?;
        Ok(body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }
}

// ─── Ollama ──────────────────────────────────────────────

#[derive(Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<Message>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: Message,
}

impl HttpBackend {
    async fn call_ollama(
        &self,
        model: &str,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, BackendError> {
        let url = format!("{}/api/chat", self.config.base_url);

        let req = OllamaChatRequest {
            model: model.to_string(),
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            stream: false,
            options: OllamaOptions {
                temperature: params.temperature,
                num_predict: params.max_output_tokens,
            },
        };

        let resp = self
            .client
            .post(&url)
            .timeout(self.timeout())
            .json(&req)
            .send()
            .await
            .map_err(transport)?;
        let resp = check_status(resp).await?;

        let body: OllamaChatResponse = resp.json().await.map_err(decode)?;
        Ok(body.message.content)
    }
}
