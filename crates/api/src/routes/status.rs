//! Status, health and metrics endpoints

use std::sync::Arc;

use actuator::MotorState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use tokio::time::Instant;

use crate::AppState;

/// `GET /is_moving` body
#[derive(Debug, Serialize)]
pub struct MotionStatusResponse {
    /// Heartbeats arriving, failsafe not engaged
    pub connected: bool,
    pub moving: bool,
    #[serde(rename = "lastCommand")]
    pub last_command: Option<String>,
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: u64,
    pub version: String,
    pub uptime_seconds: u64,
    pub watchdog: WatchdogHealth,
    pub motors: MotorState,
    pub horn: bool,
}

#[derive(Debug, Serialize)]
pub struct WatchdogHealth {
    pub failsafe_active: bool,
    pub heartbeat_age_ms: u64,
    pub trips: u64,
}

/// `GET /`
pub async fn index() -> &'static str {
    "Backend running"
}

pub async fn is_moving(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let now = Instant::now().into_std();
    let actuator = state.actuator.lock().await;

    Json(MotionStatusResponse {
        connected: !actuator.failsafe_active(),
        moving: actuator.is_moving(now),
        last_command: actuator.last_command().map(|c| c.to_string()),
    })
}

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let now = Instant::now().into_std();
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let actuator = state.actuator.lock().await;
    let snapshot = actuator.snapshot();
    let failsafe_active = actuator.failsafe_active();

    Json(HealthResponse {
        status: if failsafe_active { "failsafe" } else { "healthy" }.to_string(),
        timestamp,
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        watchdog: WatchdogHealth {
            failsafe_active,
            heartbeat_age_ms: actuator.heartbeat_age(now).as_millis() as u64,
            trips: actuator.watchdog_trips(),
        },
        motors: snapshot.motors,
        horn: snapshot.horn,
    })
}

/// Prometheus text exposition
pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::NOT_FOUND, "metrics recorder not installed".to_string()),
    }
}
