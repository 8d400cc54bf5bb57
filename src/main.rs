use tracing_subscriber::EnvFilter;

use repo_chat::api;
use repo_chat::config::Config;
use repo_chat::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    tracing::info!("Data directory: {}", config.data_dir.display());
    tracing::info!(
        "LLM provider: {} ({}), models: {}",
        config.llm.provider,
        config.llm.base_url,
        config.llm.models.join(", ")
    );
    if config.llm.api_key.is_none() && config.llm.provider != "ollama" {
        tracing::warn!("LLM_API_KEY is not set; every generated answer will be the fallback text");
    }

    let state = AppState::new(config.clone())?;
    tracing::info!("Repository root: {}", state.workspace.root().display());

    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
