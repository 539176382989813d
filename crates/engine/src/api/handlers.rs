use axum::{Json, body::Bytes, extract::State, http::StatusCode, response::Response};
use relay_shared::{PingResponse, SuggestionAck};
use serde_json::{Map, Value};
use tracing::info;

use crate::error::{ApiError, relay_json};
use crate::state::AppState;

pub async fn health_check() -> &'static str {
    "OK"
}

pub async fn ping(State(state): State<AppState>) -> Json<PingResponse> {
    Json(PingResponse {
        ok: true,
        ts: state.clock.now_ms(),
    })
}

pub async fn handle_chat(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let payload = parse_object(&body);

    let messages = match payload.get("messages") {
        Some(messages) if messages.is_array() => messages,
        _ => return Err(ApiError::InvalidRequest("Messages array is required")),
    };

    info!(count = messages.as_array().map(Vec::len).unwrap_or(0), "Forwarding chat");
    let reply = state.upstream.forward_chat(messages).await?;

    Ok(relay_json(StatusCode::OK, reply))
}

pub async fn handle_submit_suggestion(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SuggestionAck>, ApiError> {
    let payload = parse_object(&body);

    let message = match payload.get("message").and_then(Value::as_str) {
        Some(message) if !message.trim().is_empty() => message,
        _ => return Err(ApiError::InvalidRequest("Message is required")),
    };

    info!(len = message.len(), "Forwarding suggestion");
    state.upstream.forward_suggestion(message).await?;

    Ok(Json(SuggestionAck { success: true }))
}

/// Missing, non-JSON and non-object bodies all read as `{}`, so shape checks report them.
fn parse_object(body: &[u8]) -> Map<String, Value> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}
