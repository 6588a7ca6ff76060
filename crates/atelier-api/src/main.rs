use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use atelier::llm::{ChatClient, CompletionClient};
use atelier::session::{SessionFile, SessionStore};

use atelier_api::{build_router, config::Config, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let config = Config::load()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    init_logging(&config);

    tracing::info!("Starting Atelier API server");
    tracing::info!(
        "Completion endpoint: {} (model {})",
        config.llm.endpoint,
        config.llm.model
    );

    let client: Arc<dyn ChatClient> = Arc::new(CompletionClient::new(
        config.llm.endpoint.clone(),
        config.api_key.as_deref(),
    )?);

    let storage = SessionFile::new(&config.storage.dir);
    tracing::info!("Session store: {}", storage.path().display());
    let store = SessionStore::open(storage).await;

    let state = Arc::new(AppState::new(config.clone(), store, client));
    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.logging.format.as_str() {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }
}
