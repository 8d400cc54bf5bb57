use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Root for all local data; cloned and extracted repos live under `repos/`
    pub data_dir: PathBuf,
    /// Server bind address
    pub bind_addr: String,
    /// Generative backend configuration
    pub llm: LlmConfig,
    /// Model cascade retry policy
    pub retry: RetryConfig,
    /// Context selection limits
    pub selector: SelectorConfig,
    /// In-memory repository store limits
    pub store: StoreConfig,
    /// Repository acquisition limits
    pub acquire: AcquireConfig,
    /// Summarization batching
    pub summary: SummaryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "gemini", "openai" or "ollama"
    pub provider: String,
    /// Base URL for the provider API
    pub base_url: String,
    /// Ordered model cascade; the first model to answer wins
    pub models: Vec<String>,
    /// API key (not needed for ollama)
    pub api_key: Option<String>,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Attempts per model, including the first
    pub max_attempts_per_model: u32,
    /// Delay before the first retry; doubles for each further retry
    pub base_delay_ms: u64,
    /// Overall budget for one cascade run (None = unbounded)
    pub deadline_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorConfig {
    pub max_chunks: usize,
    pub max_chars: usize,
    /// Chunks accepted even with a zero score, so vague questions still get context
    pub min_context_chunks: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub ttl_secs: u64,
    pub max_entries: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcquireConfig {
    /// Only HTTPS URLs on this host are cloned
    pub allowed_host: String,
    pub clone_timeout_secs: u64,
    /// Largest accepted archive upload in MB
    pub max_upload_mb: usize,
    /// Personal access token for cloning private repos
    pub git_token: Option<String>,
    /// Ingestions allowed to run at the same time
    pub max_concurrent_ingests: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryConfig {
    pub batch_files: usize,
    pub batch_chars: usize,
    /// File summaries fed into the overview and architecture prompts
    pub overview_limit: usize,
    /// Batches summarized at the same time
    pub concurrency: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            bind_addr: "127.0.0.1:9000".to_string(),
            llm: LlmConfig::default(),
            retry: RetryConfig::default(),
            selector: SelectorConfig::default(),
            store: StoreConfig::default(),
            acquire: AcquireConfig::default(),
            summary: SummaryConfig::default(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            models: vec![
                "gemini-2.0-flash".to_string(),
                "gemini-2.0-flash-lite".to_string(),
                "gemini-1.5-flash".to_string(),
            ],
            api_key: None,
            timeout_secs: 120,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts_per_model: 2,
            base_delay_ms: 1000,
            deadline_secs: None,
        }
    }
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            max_chunks: 30,
            max_chars: 60_000,
            min_context_chunks: 5,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 60 * 60,
            max_entries: 50,
        }
    }
}

impl Default for AcquireConfig {
    fn default() -> Self {
        Self {
            allowed_host: "github.com".to_string(),
            clone_timeout_secs: 300,
            max_upload_mb: 50,
            git_token: None,
            max_concurrent_ingests: 2,
        }
    }
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            batch_files: 15,
            batch_chars: 60_000,
            overview_limit: 80,
            concurrency: 2,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = std::env::var("REPO_CHAT_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Ok(addr) = std::env::var("REPO_CHAT_BIND_ADDR") {
            config.bind_addr = addr;
        }

        if let Ok(provider) = std::env::var("LLM_PROVIDER") {
            config.llm.provider = provider;
        }
        if let Ok(url) = std::env::var("LLM_BASE_URL") {
            config.llm.base_url = url;
        }
        if let Ok(models) = std::env::var("LLM_MODELS") {
            let models = parse_model_list(&models);
            if !models.is_empty() {
                config.llm.models = models;
            }
        }
        if let Ok(key) = std::env::var("LLM_API_KEY") {
            config.llm.api_key = Some(key);
        }
        if let Ok(val) = std::env::var("LLM_TIMEOUT_SECS") {
            if let Ok(v) = val.parse() {
                config.llm.timeout_secs = v;
            }
        }

        if let Ok(val) = std::env::var("LLM_MAX_ATTEMPTS") {
            if let Ok(v) = val.parse::<u32>() {
                config.retry.max_attempts_per_model = v.max(1);
            }
        }
        if let Ok(val) = std::env::var("LLM_BACKOFF_MS") {
            if let Ok(v) = val.parse() {
                config.retry.base_delay_ms = v;
            }
        }
        if let Ok(val) = std::env::var("LLM_DEADLINE_SECS") {
            if let Ok(v) = val.parse() {
                config.retry.deadline_secs = Some(v);
            }
        }

        if let Ok(val) = std::env::var("REPO_CHAT_MAX_CONTEXT_CHUNKS") {
            if let Ok(v) = val.parse() {
                config.selector.max_chunks = v;
            }
        }
        if let Ok(val) = std::env::var("REPO_CHAT_MAX_CONTEXT_CHARS") {
            if let Ok(v) = val.parse() {
                config.selector.max_chars = v;
            }
        }

        if let Ok(val) = std::env::var("REPO_CHAT_STORE_TTL_SECS") {
            if let Ok(v) = val.parse() {
                config.store.ttl_secs = v;
            }
        }
        if let Ok(val) = std::env::var("REPO_CHAT_STORE_MAX_ENTRIES") {
            if let Ok(v) = val.parse() {
                config.store.max_entries = v;
            }
        }

        if let Ok(host) = std::env::var("REPO_CHAT_ALLOWED_HOST") {
            config.acquire.allowed_host = host;
        }
        if let Ok(val) = std::env::var("REPO_CHAT_CLONE_TIMEOUT_SECS") {
            if let Ok(v) = val.parse() {
                config.acquire.clone_timeout_secs = v;
            }
        }
        if let Ok(val) = std::env::var("REPO_CHAT_MAX_UPLOAD_MB") {
            if let Ok(v) = val.parse() {
                config.acquire.max_upload_mb = v;
            }
        }
        if let Ok(token) = std::env::var("REPO_CHAT_GIT_TOKEN") {
            config.acquire.git_token = Some(token);
        }
        if let Ok(val) = std::env::var("REPO_CHAT_MAX_CONCURRENT_INGESTS") {
            if let Ok(v) = val.parse::<usize>() {
                config.acquire.max_concurrent_ingests = v.max(1);
            }
        }

        if let Ok(val) = std::env::var("REPO_CHAT_SUMMARY_CONCURRENCY") {
            if let Ok(v) = val.parse::<usize>() {
                config.summary.concurrency = v.max(1);
            }
        }

        config
    }

    pub fn repos_dir(&self) -> PathBuf {
        self.data_dir.join("repos")
    }
}

impl RetryConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_secs.map(Duration::from_secs)
    }
}

impl AcquireConfig {
    pub fn clone_timeout(&self) -> Duration {
        Duration::from_secs(self.clone_timeout_secs)
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb * 1024 * 1024
    }
}

fn parse_model_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .collect()
}
