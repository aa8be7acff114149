//! Heart disease risk prediction
//!
//! ```text
//! ┌──────────────┐   model.json    ┌──────────────────────────────────┐
//! │ heartrisk-   │  metadata.json  │ heartrisk-server                 │
//! │ train        │ ──────────────▶ │  ┌────────┐  ┌────────────────┐  │
//! │ (CSV → fit)  │                 │  │ Axum   │─▶│ Inference      │  │
//! └──────────────┘                 │  │ routes │  │ service + risk │  │
//!                                  │  └────────┘  └────────────────┘  │
//!                                  └──────────────────────────────────┘
//! ```

pub mod artifact;
pub mod classifier;
pub mod config;
pub mod error;
pub mod handlers;
pub mod inference;
pub mod models;
pub mod report;
pub mod risk;
pub mod training;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub use error::{AppError, AppResult};

use crate::config::Config;
use crate::inference::InferenceService;
use crate::risk::RiskPolicy;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<InferenceService>,
    pub config: Config,
}

impl AppState {
    pub fn new(service: InferenceService, config: Config) -> Self {
        Self {
            service: Arc::new(service),
            config,
        }
    }

    /// Policy for one request: the query override if given, else the
    /// configured default.
    pub fn resolve_policy(&self, requested: Option<&str>) -> AppResult<RiskPolicy> {
        match requested {
            None => Ok(self.service.default_policy()),
            Some(name) => RiskPolicy::from_name(name, self.config.risk_bands).ok_or_else(|| {
                AppError::InvalidRequest(format!(
                    "Unknown risk_policy '{}', expected 'two-tier' or 'three-tier'",
                    name
                ))
            }),
        }
    }
}

/// Create the main router with all routes
pub fn create_router(state: AppState) -> Router {
    let body_limit = state.config.max_body_bytes;

    Router::new()
        .route("/", get(handlers::home::index))
        .route("/health", get(handlers::health::check))
        .route("/predict", post(handlers::predict::single))
        .route("/predict/batch", post(handlers::predict::batch))
        .route("/predict/batch/csv", post(handlers::predict::batch_csv))
        .route("/report", post(handlers::report::render))
        .fallback(handlers::not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
