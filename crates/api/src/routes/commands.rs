//! Motor, horn, stop and heartbeat endpoints

use std::sync::Arc;

use actuator::{CommandOutcome, LastCommand, Output};
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, MethodRouter},
};
use tokio::time::Instant;

use super::status;
use crate::AppState;

/// Request header carrying the command sequence number
pub const SEQUENCE_HEADER: &str = "sequence";

/// `GET /<output>/on|off` for one output
pub fn command_route(output: Output) -> MethodRouter<Arc<AppState>> {
    get(
        move |State(state): State<Arc<AppState>>, Path(action): Path<String>, headers: HeaderMap| async move {
            command(state, output, &action, &headers).await
        },
    )
}

async fn command(state: Arc<AppState>, output: Output, action: &str, headers: &HeaderMap) -> Response {
    let active = match action {
        "on" => true,
        "off" => false,
        _ => return (StatusCode::NOT_FOUND, status(format!("unknown action {}", action))).into_response(),
    };
    let sequence = match parse_sequence(headers) {
        Ok(sequence) => sequence,
        Err(reason) => return (StatusCode::BAD_REQUEST, status(reason)).into_response(),
    };

    let now = Instant::now().into_std();
    let outcome = state.actuator.lock().await.dispatch(output, active, sequence, now);

    match outcome {
        CommandOutcome::Accepted => status(LastCommand::Set { output, active }.to_string()).into_response(),
        CommandOutcome::Stale => status("stale command ignored").into_response(),
    }
}

/// Every motor and horn command must carry a sequence number
fn parse_sequence(headers: &HeaderMap) -> Result<u64, String> {
    let value = headers
        .get(SEQUENCE_HEADER)
        .ok_or_else(|| "missing sequence header".to_string())?;
    value
        .to_str()
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .ok_or_else(|| "invalid sequence header".to_string())
}

/// `GET /stop`
pub async fn stop_all(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.actuator.lock().await.stop_all();
    status("all stopped")
}

/// `POST /heartbeat`
pub async fn heartbeat(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let now = Instant::now().into_std();
    state.actuator.lock().await.receive_heartbeat(now);
    status("ok")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_parse_sequence() {
        let mut headers = HeaderMap::new();
        assert_eq!(parse_sequence(&headers), Err("missing sequence header".to_string()));

        headers.insert(SEQUENCE_HEADER, HeaderValue::from_static("42"));
        assert_eq!(parse_sequence(&headers), Ok(42));

        headers.insert(SEQUENCE_HEADER, HeaderValue::from_static("-1"));
        assert_eq!(parse_sequence(&headers), Err("invalid sequence header".to_string()));
    }
}
