//! QueryMind application binary - composition root.
//!
//! Ties together the QueryMind crates into a single executable:
//! 1. Load configuration from TOML
//! 2. Connect the external services (Gemini, Postgres, retrieval, Wikipedia)
//! 3. Build the pipeline engine
//! 4. Start the axum REST API server

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use querymind_api::routes;
use querymind_api::state::AppState;
use querymind_core::config::QuerymindConfig;
use querymind_pipeline::tool::RetryPolicy;
use querymind_pipeline::{Engine, PipelineOptions, PipelineServices};
use querymind_services::{
    GeminiGateway, HttpMemoryStore, HttpVectorSearcher, MemoryStore, NullMemory, SqlStore,
    WikipediaClient,
};

/// Resolve the config file path (QUERYMIND_CONFIG env, or ~/.querymind/config.toml).
fn config_path() -> PathBuf {
    if let Ok(p) = std::env::var("QUERYMIND_CONFIG") {
        return PathBuf::from(p);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".querymind").join("config.toml");
    }
    PathBuf::from("config.toml")
}

#[tokio::main]
async fn main() -> querymind_core::Result<()> {
    // Tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Starting QueryMind v{}", env!("CARGO_PKG_VERSION"));

    // Config.
    let config_file = config_path();
    let config = QuerymindConfig::load_or_default(&config_file);
    tracing::info!(path = %config_file.display(), "Configuration loaded");

    // Model gateway.
    let gateway = GeminiGateway::new(
        &config.gateway.base_url,
        &config.gateway.model,
        &config.gateway.api_key,
        Duration::from_secs(config.gateway.timeout_secs),
    )?;
    tracing::info!(model = %config.gateway.model, "Model gateway ready");

    // Postgres.
    let store = SqlStore::connect(&config.database.url, config.database.max_connections).await?;
    tracing::info!(max_connections = config.database.max_connections, "Database pool opened");

    // Retrieval sidecar.
    let searcher = HttpVectorSearcher::new(&config.vector.base_url, &config.vector.collection)?;
    tracing::info!(collection = %config.vector.collection, "Vector searcher ready");

    // Wikipedia.
    let encyclopedia = WikipediaClient::new(
        &config.encyclopedia.base_url,
        Duration::from_secs(config.encyclopedia.page_timeout_secs),
        Duration::from_secs(config.encyclopedia.summary_timeout_secs),
    )?;

    // Conversation memory, optional.
    let memory: Arc<dyn MemoryStore> = if config.memory.enabled {
        tracing::info!("Conversation memory enabled");
        Arc::new(HttpMemoryStore::new(&config.memory.base_url, &config.memory.api_key)?)
    } else {
        tracing::info!("Conversation memory disabled");
        Arc::new(NullMemory)
    };

    // Pipeline engine.
    let services = PipelineServices {
        gateway: Arc::new(gateway),
        store: Arc::new(store),
        searcher: Arc::new(searcher),
        encyclopedia: Arc::new(encyclopedia),
    };
    let options = PipelineOptions {
        top_k: config.vector.top_k,
        retry: RetryPolicy {
            max_attempts: config.encyclopedia.max_attempts,
            initial_backoff: Duration::from_secs(config.encyclopedia.initial_backoff_secs),
        },
        summary_max_chars: config.encyclopedia.summary_max_chars,
    };
    let engine = Engine::new(services, options);

    // === API server ===

    let port = std::env::var("QUERYMIND_PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(config.server.port);
    let addr = format!("0.0.0.0:{}", port);

    let state = AppState::new(engine, memory);
    let router = routes::create_router(state);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(addr = %addr, error = %e, "Failed to bind — is another instance running?");
            tracing::error!("Try: QUERYMIND_PORT={} cargo run -p querymind-app", port + 1);
            return Err(e.into());
        }
    };

    tracing::info!(addr = %addr, "API server listening");

    axum::serve(listener, router).await?;

    Ok(())
}
