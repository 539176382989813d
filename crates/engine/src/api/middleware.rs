use std::collections::HashSet;

use axum::{
    extract::{Request, State},
    http::{
        HeaderMap, HeaderValue, Method, StatusCode,
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE, ORIGIN, VARY,
        },
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::state::AppState;

const ALLOW_METHODS: &str = "GET, POST, OPTIONS";
const ALLOW_HEADERS: &str = "Content-Type, Authorization";
const PREFLIGHT_MAX_AGE_SECS: u64 = 86_400;

/// Exact-match origin allow-list.
pub struct CorsPolicy {
    allowed: HashSet<String>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum OriginCheck {
    /// On the list; reflect it back.
    Allowed(HeaderValue),
    /// No `Origin` header, so not a browser cross-origin call.
    Absent,
    Rejected(String),
}

impl CorsPolicy {
    pub fn new(origins: impl IntoIterator<Item = String>) -> Self {
        Self {
            allowed: origins.into_iter().collect(),
        }
    }

    pub fn check(&self, origin: Option<&HeaderValue>) -> OriginCheck {
        let Some(origin) = origin else {
            return OriginCheck::Absent;
        };

        match origin.to_str() {
            Ok(value) if self.allowed.contains(value) => OriginCheck::Allowed(origin.clone()),
            _ => OriginCheck::Rejected(String::from_utf8_lossy(origin.as_bytes()).into_owned()),
        }
    }
}

/// Applies the allow-list to every request and answers pre-flights before routing.
pub async fn enforce_cors(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let reflected = match state.cors.check(req.headers().get(ORIGIN)) {
        OriginCheck::Allowed(origin) => Some(origin),
        OriginCheck::Absent => None,
        OriginCheck::Rejected(origin) => {
            warn!(%origin, method = %req.method(), path = %req.uri().path(), "Rejected cross-origin request");
            return ApiError::CorsRejected(origin).into_response();
        }
    };

    let mut response = if req.method() == Method::OPTIONS {
        debug!(path = %req.uri().path(), "Answering pre-flight");
        let mut preflight = StatusCode::NO_CONTENT.into_response();
        preflight
            .headers_mut()
            .insert(ACCESS_CONTROL_MAX_AGE, HeaderValue::from(PREFLIGHT_MAX_AGE_SECS));
        preflight
    } else {
        next.run(req).await
    };

    apply_cors_headers(response.headers_mut(), reflected);
    response
}

fn apply_cors_headers(headers: &mut HeaderMap, origin: Option<HeaderValue>) {
    if let Some(origin) = origin {
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    }
    headers.append(VARY, HeaderValue::from_static("Origin"));
    headers.insert(ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static(ALLOW_METHODS));
    headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static(ALLOW_HEADERS));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> CorsPolicy {
        CorsPolicy::new(["https://justmicho.com".to_string(), "http://localhost:5173".to_string()])
    }

    #[test]
    fn listed_origin_is_reflected() {
        let origin = HeaderValue::from_static("https://justmicho.com");
        assert_eq!(policy().check(Some(&origin)), OriginCheck::Allowed(origin));
    }

    #[test]
    fn match_is_exact() {
        for candidate in [
            "https://justmicho.com/",
            "http://justmicho.com",
            "https://justmicho.com.evil.example",
            "http://localhost:5174",
        ] {
            let origin = HeaderValue::from_static(candidate);
            assert_eq!(
                policy().check(Some(&origin)),
                OriginCheck::Rejected(candidate.to_string()),
                "{candidate} should be rejected"
            );
        }
    }

    #[test]
    fn missing_origin_is_let_through() {
        assert_eq!(policy().check(None), OriginCheck::Absent);
    }

    #[test]
    fn non_utf8_origin_is_rejected() {
        let origin = HeaderValue::from_bytes(b"https://\xffbad").unwrap();
        assert!(matches!(policy().check(Some(&origin)), OriginCheck::Rejected(_)));
    }
}
