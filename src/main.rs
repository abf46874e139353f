//! FraudGuard scoring server
//!
//! Scores 29-value transaction feature vectors with a pre-trained binary
//! classifier, records every decision and serves aggregate trends.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                      FRAUDGUARD                          │
//! ├──────────────────────────────────────────────────────────┤
//! │  ┌──────────┐   ┌──────────────┐   ┌──────────────────┐  │
//! │  │  API     │──▶│  Scoring     │──▶│  Classifier      │  │
//! │  │  (Axum)  │   │  + Batch     │   │  (ONNX / linear) │  │
//! │  └────┬─────┘   └──────┬───────┘   └──────────────────┘  │
//! │       │  Trends        ▼                                 │
//! │       └──────▶ ┌──────────────────────┐                  │
//! │                │  Outcome store       │                  │
//! │                │  PostgreSQL | SQLite │                  │
//! │                └──────────────────────┘                  │
//! └──────────────────────────────────────────────────────────┘
//! ```

mod config;
mod error;
mod handlers;
mod logic;
mod models;
mod store;

#[cfg(test)]
mod testing;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Config, LogFormat};
use crate::error::StartupError;
use crate::logic::classifier::InferenceEngine;
use crate::logic::scoring::ScoringService;
use crate::store::OutcomeStore;

pub use error::{AppError, AppResult};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing(LogFormat::from_env());

    let config = Config::from_env();
    tracing::info!(
        environment = %config.environment,
        policy = ?config.persistence_policy,
        "FraudGuard starting..."
    );

    // Model first: no point opening a store for a service that cannot score
    let engine = Arc::new(InferenceEngine::load(&config.model_path)?);

    let store = store::connect(&config).await.map_err(StartupError::Store)?;
    store.init_schema().await.map_err(StartupError::Schema)?;
    tracing::info!(backend = store.backend().as_str(), "Outcome store ready");

    let scorer = Arc::new(ScoringService::new(
        engine.clone(),
        store.clone(),
        config.persistence_policy,
    ));

    let state = AppState {
        config: config.clone(),
        scorer,
        store,
        engine,
    };

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "fraudguard=debug,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub scorer: Arc<ScoringService>,
    pub store: Arc<dyn OutcomeStore>,
    pub engine: Arc<InferenceEngine>,
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::check))
        // Scoring
        .route("/predict", post(handlers::predict::predict))
        .route("/api/v1/predict", post(handlers::predict::predict))
        .route("/api/v1/batch", post(handlers::batch::score_json))
        .route("/api/v1/batch/csv", post(handlers::batch::score_csv))
        // Analytics
        .route("/api/v1/stats", get(handlers::analytics::stats))
        .route("/api/v1/trend", get(handlers::analytics::daily_trend))
        .route("/api/v1/predictions/recent", get(handlers::analytics::recent))
        .route("/api/v1/model", get(handlers::model::info))
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
