pub mod commands;
pub mod status;

use axum::Json;
use serde::Serialize;

/// `{"status": "..."}` body used by every command endpoint
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
}

pub fn status(text: impl Into<String>) -> Json<StatusResponse> {
    Json(StatusResponse { status: text.into() })
}
