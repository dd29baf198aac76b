use tracing_subscriber::EnvFilter;

use menu_recommender::api;
use menu_recommender::config::Config;
use menu_recommender::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Secrets may come from a local .env file
    let dotenv = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = dotenv {
        tracing::debug!("No .env file loaded: {e}");
    }

    let config = Config::from_env();
    tracing::info!("Menu file: {}", config.menu_path.display());
    tracing::info!(
        "Index: {} (collection {}, {} search, limit {})",
        config.index.base_url,
        config.index.collection,
        config.index.search_mode,
        config.index.limit
    );
    tracing::info!("LLM provider: {} ({})", config.llm.provider, config.llm.chat_model);

    let state = AppState::new(&config)?;
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
