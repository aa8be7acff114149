//! HeartRisk inference server
//!
//! Loads the trained model and its feature metadata, then serves
//! predictions, batch scoring and patient reports over HTTP.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use heartrisk::artifact;
use heartrisk::config::Config;
use heartrisk::inference::InferenceService;
use heartrisk::{create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    init_tracing();

    let config = Config::from_env().context("invalid configuration")?;

    tracing::info!("HeartRisk server starting...");
    tracing::info!(
        environment = %config.environment,
        risk_policy = config.risk_policy.name(),
        "Model: {}",
        config.model_path.display()
    );

    let loaded = match artifact::load_artifacts(&config.model_path, &config.metadata_path) {
        Ok(loaded) => loaded,
        Err(err) => {
            tracing::error!("Failed to load model artifacts: {}", err);
            return Err(err).context("cannot start without a trained model");
        }
    };

    let service = InferenceService::new(loaded.contract(), Arc::new(loaded.model), config.risk_policy);
    let state = AppState::new(service, config.clone());
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "heartrisk=debug,tower_http=debug".into());

    let json = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", err);
        return;
    }
    tracing::info!("Shutdown signal received");
}
