//! Theft Scoring API Server
//!
//! REST boundary for the scoring pipeline. The model artifact is loaded
//! once at startup and shared read-only across requests; if the load
//! fails the service runs degraded and every scoring call fails fast.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use inference_engine::{AnomalyModel, OnnxModel, UnavailableModel};
use rule_engine::{RuleConfig, RuleEngine};
use scoring::ScoringPipeline;
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod error;
mod routes;
mod settings;

pub use error::ApiError;
pub use settings::Settings;

/// Application state shared across handlers
pub struct AppState {
    /// Scoring pipeline; fails closed while no artifact is loaded
    pub scorer: ScoringPipeline,
    /// Whether the trained artifact loaded at startup
    pub model_loaded: bool,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: std::time::Instant,
}

impl AppState {
    /// Build state from settings, loading the model artifact.
    /// A failed load leaves the service degraded rather than refusing
    /// to start; scoring then fails closed per request.
    pub fn from_settings(settings: &Settings) -> Self {
        let (model, model_loaded): (Arc<dyn AnomalyModel>, bool) =
            match OnnxModel::load(&settings.model_path) {
                Ok(model) => (Arc::new(model), true),
                Err(e) => {
                    warn!(error = %e, "model artifact failed to load, scoring is unavailable");
                    (Arc::new(UnavailableModel), false)
                }
            };
        Self {
            scorer: ScoringPipeline::new(model, RuleEngine::new(settings.rules.clone())),
            model_loaded,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: std::time::Instant::now(),
        }
    }

    /// State over an already-constructed model (tests, dev rigs)
    pub fn with_model(model: Arc<dyn AnomalyModel>, rules: RuleConfig) -> Self {
        Self {
            scorer: ScoringPipeline::new(model, RuleEngine::new(rules)),
            model_loaded: true,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: std::time::Instant::now(),
        }
    }

    /// Degraded state with no model loaded
    pub fn degraded() -> Self {
        Self {
            scorer: ScoringPipeline::new(Arc::new(UnavailableModel), RuleEngine::default()),
            model_loaded: false,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: std::time::Instant::now(),
        }
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub model: ComponentHealth,
}

/// Individual component health
#[derive(Debug, Serialize)]
pub struct ComponentHealth {
    pub status: String,
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/health", get(health_handler))
        .route("/api/v1/predict", post(routes::predict::predict))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check handler; degraded while the model is unavailable
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let model_loaded = state.model_loaded;
    let response = HealthResponse {
        status: if model_loaded { "healthy" } else { "degraded" }.to_string(),
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        model: ComponentHealth {
            status: if model_loaded { "ok" } else { "unavailable" }.to_string(),
        },
    };
    let status = if model_loaded {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(response))
}

/// Initialize logging
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

/// Run the server
pub async fn run_server(settings: Settings) -> anyhow::Result<()> {
    if let Some(addr) = settings.metrics_addr {
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()?;
        info!("metrics exporter on {}", addr);
    }

    let state = Arc::new(AppState::from_settings(&settings));
    let app = create_router(state);

    info!("starting API server on {}", settings.bind_addr);
    let listener = tokio::net::TcpListener::bind(&settings.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
