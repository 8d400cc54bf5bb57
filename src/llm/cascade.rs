use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::config::RetryConfig;
use crate::llm::backend::{BackendError, GenerationParams, GenerativeBackend};
use crate::models::Provenance;

/// Text produced by the cascade and the tier that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    pub text: String,
    pub provenance: Provenance,
}

/// Ordered list of models tried in turn, each with bounded retries.
#[derive(Clone)]
pub struct ModelCascade {
    backend: Arc<dyn GenerativeBackend>,
    models: Vec<String>,
    retry: RetryConfig,
}

impl ModelCascade {
    pub fn new(backend: Arc<dyn GenerativeBackend>, models: Vec<String>, retry: RetryConfig) -> Self {
        Self {
            backend,
            models,
            retry,
        }
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    /// Delay before retry number `retry_index` (0-based) on the same model.
    pub fn backoff(&self, retry_index: u32) -> Duration {
        self.retry
            .base_delay()
            .saturating_mul(2u32.saturating_pow(retry_index))
    }

    /// Run the cascade. Never fails: when every model is exhausted, or a
    /// non-retryable error stops the run, `fallback` is returned with
    /// [`Provenance::Fallback`].
    pub async fn generate(&self, prompt: &str, fallback: &str, params: &GenerationParams) -> Generation {
        let started = Instant::now();
        let deadline = self.retry.deadline();
        let attempts = self.retry.max_attempts_per_model.max(1);

        'models: for model in &self.models {
            for attempt in 0..attempts {
                if attempt > 0 {
                    let delay = self.backoff(attempt - 1);
                    if let Some(limit) = deadline {
                        if started.elapsed() + delay >= limit {
                            tracing::warn!("Model cascade deadline of {limit:?} reached before retrying {model}");
                            break 'models;
                        }
                    }
                    tokio::time::sleep(delay).await;
                }

                let result = match deadline {
                    Some(limit) => {
                        let remaining = limit.saturating_sub(started.elapsed());
                        tokio::time::timeout(remaining, self.backend.generate(model, prompt, params))
                            .await
                            .unwrap_or_else(|_| {
                                Err(BackendError::Transport("cascade deadline exceeded".to_string()))
                            })
                    }
                    None => self.backend.generate(model, prompt, params).await,
                };

                let err = match result {
                    Ok(text) if !text.trim().is_empty() => {
                        tracing::info!("Model {model} answered on attempt {}", attempt + 1);
                        return Generation {
                            text: text.trim().to_string(),
                            provenance: Provenance::Model(model.clone()),
                        };
                    }
                    Ok(_) => BackendError::Empty,
                    Err(e) => e,
                };

                if !err.is_retryable() {
                    tracing::warn!("Model {model} failed with non-retryable error, aborting cascade: {err}");
                    break 'models;
                }
                tracing::warn!(
                    "Model {model} attempt {}/{attempts} failed: {err}",
                    attempt + 1
                );
            }
        }

        tracing::warn!("All models exhausted, returning fallback text");
        Generation {
            text: fallback.to_string(),
            provenance: Provenance::Fallback,
        }
    }
}
