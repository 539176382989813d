use axum::{
    Json,
    body::Bytes,
    http::{StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use relay_shared::ErrorBody;
use thiserror::Error;

/// Generic message for failures whose cause stays in the logs.
pub const SERVER_ERROR: &str = "Server error";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    InvalidRequest(&'static str),

    #[error("{0}")]
    UpstreamUnavailable(String),

    /// Upstream answered with a non-success status; `body` is JSON, relayed byte for byte.
    #[error("upstream returned {status}")]
    Upstream { status: StatusCode, body: Bytes },

    #[error("CORS: Origin {0} not allowed")]
    CorsRejected(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::UpstreamUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Upstream { status, .. } => *status,
            ApiError::CorsRejected(_) => StatusCode::FORBIDDEN,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        match self {
            ApiError::Upstream { body, .. } => relay_json(status, body),
            other => (status, Json(ErrorBody::new(other.to_string()))).into_response(),
        }
    }
}

/// Sends already-serialized JSON without re-encoding it.
pub fn relay_json(status: StatusCode, body: Bytes) -> Response {
    (status, [(CONTENT_TYPE, "application/json")], body).into_response()
}
