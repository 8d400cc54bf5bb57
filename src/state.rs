use std::sync::Arc;

use crate::acquire::Workspace;
use crate::answer::AnswerEngine;
use crate::config::Config;
use crate::llm::{GenerativeBackend, HttpBackend, ModelCascade};
use crate::store::{MemoryStore, RepoStore};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub workspace: Workspace,
    pub store: Arc<dyn RepoStore>,
    pub cascade: ModelCascade,
    pub engine: AnswerEngine,
    pub ingest_semaphore: Arc<tokio::sync::Semaphore>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .timeout(std::time::Duration::from_secs(config.llm.timeout_secs))
            .build()?;
        let backend = HttpBackend::new(http_client, config.llm.clone());
        Self::with_backend(config, Arc::new(backend))
    }

    /// Build the state around any generative backend.
    pub fn with_backend(config: Config, backend: Arc<dyn GenerativeBackend>) -> anyhow::Result<Self> {
        let workspace = Workspace::new(config.repos_dir(), &config.acquire)?;
        let store: Arc<dyn RepoStore> = Arc::new(MemoryStore::new(&config.store));
        let cascade = ModelCascade::new(backend, config.llm.models.clone(), config.retry.clone());
        let engine = AnswerEngine::new(cascade.clone(), Arc::clone(&store), config.selector.clone());
        let max_ingests = config.acquire.max_concurrent_ingests.max(1);

        Ok(Self {
            config,
            workspace,
            store,
            cascade,
            engine,
            ingest_semaphore: Arc::new(tokio::sync::Semaphore::new(max_ingests)),
        })
    }
}
