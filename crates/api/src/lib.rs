//! Actuation Node API Server
//!
//! HTTP surface the remote controller talks to: motor and horn commands,
//! heartbeats, the motion-status query and health/metrics endpoints.

use std::future::Future;
use std::sync::Arc;

use actuator::{ActuatorError, Output, SharedActuator};
use axum::{routing::get, routing::post, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use thiserror::Error;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

pub mod config;
mod routes;

pub use config::{ActuatorSettings, ServerConfig};

/// API error types
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("Invalid server config: {0}")]
    InvalidConfig(String),

    #[error("Actuator error: {0}")]
    Actuator(#[from] ActuatorError),

    #[error("Server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Application state shared across handlers
pub struct AppState {
    /// Actuator state; the only mutable part
    pub actuator: SharedActuator,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: std::time::Instant,
    /// Prometheus renderer, when a recorder is installed
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(actuator: SharedActuator, metrics: Option<PrometheusHandle>) -> Self {
        Self {
            actuator,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: std::time::Instant::now(),
            metrics,
        }
    }
}

/// Create the application router
pub fn create_router(state: Arc<AppState>, cors: bool) -> Router {
    let mut router = Router::new()
        .route("/", get(routes::status::index))
        .route("/stop", get(routes::commands::stop_all))
        .route("/heartbeat", post(routes::commands::heartbeat))
        .route("/is_moving", get(routes::status::is_moving))
        .route("/api/v1/health", get(routes::status::health))
        .route("/metrics", get(routes::status::metrics));

    for output in Output::ALL {
        router = router.route(
            &format!("/{}/:action", output.as_str()),
            routes::commands::command_route(output),
        );
    }

    let router = router.with_state(state).layer(TraceLayer::new_for_http());
    if cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

/// Serve until `shutdown` resolves
pub async fn run_server(
    config: &ServerConfig,
    state: Arc<AppState>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), ApiError> {
    let app = create_router(state, config.cors);

    info!("Starting API server on {}", config.bind);

    let listener = tokio::net::TcpListener::bind(&config.bind).await?;
    axum::serve(listener, app).with_graceful_shutdown(shutdown).await?;

    Ok(())
}
