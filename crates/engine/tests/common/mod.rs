// Mock upstream and app helpers shared by the integration tests
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::{
    Router,
    body::{Body, Bytes, to_bytes},
    extract::State,
    http::{HeaderMap, Method, Request, StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use relay_engine::{AppState, Config, api::build_app};
use serde_json::Value;
use tokio::{net::TcpListener, task::JoinHandle};
use tower::ServiceExt;

pub const OPENAI_KEY: &str = "sk-test";
pub const SUPABASE_KEY: &str = "anon-test";

/// A request the mock upstream received.
#[derive(Clone, Debug)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Value,
}

#[derive(Clone)]
struct Canned {
    status: StatusCode,
    content_type: &'static str,
    body: String,
}

#[derive(Clone)]
struct MockState {
    requests: Arc<Mutex<Vec<Recorded>>>,
    reply: Arc<Mutex<Canned>>,
}

/// Stands in for both the completions API and the database REST API.
pub struct MockUpstream {
    pub base_url: String,
    state: MockState,
    handle: JoinHandle<()>,
}

impl MockUpstream {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let state = MockState {
            requests: Arc::new(Mutex::new(Vec::new())),
            reply: Arc::new(Mutex::new(Canned {
                status: StatusCode::OK,
                content_type: "application/json",
                body: "{}".to_string(),
            })),
        };

        let app = Router::new().fallback(record).with_state(state.clone());
        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("Mock upstream error: {e}");
            }
        });

        Self { base_url, state, handle }
    }

    pub fn reply_with(&self, status: StatusCode, content_type: &'static str, body: impl Into<String>) {
        *self.state.reply.lock().unwrap() = Canned {
            status,
            content_type,
            body: body.into(),
        };
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.requests.lock().unwrap().clone()
    }
}

impl Drop for MockUpstream {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn record(State(state): State<MockState>, req: axum::extract::Request) -> Response {
    let (parts, body) = req.into_parts();
    let bytes = to_bytes(body, usize::MAX).await.unwrap_or_default();

    state.requests.lock().unwrap().push(Recorded {
        method: parts.method,
        path: parts.uri.path().to_string(),
        headers: parts.headers,
        body: serde_json::from_slice(&bytes).unwrap_or(Value::Null),
    });

    let canned = state.reply.lock().unwrap().clone();
    (canned.status, [(CONTENT_TYPE, canned.content_type)], canned.body).into_response()
}

pub fn config_for(base_url: &str) -> Config {
    let chat_url = format!("{base_url}/v1/chat/completions");

    Config::from_lookup(|key| match key {
        "OPENAI_API_KEY" => Some(OPENAI_KEY.to_string()),
        "OPENAI_API_URL" => Some(chat_url.clone()),
        "SUPABASE_URL" => Some(base_url.to_string()),
        "SUPABASE_ANON_KEY" => Some(SUPABASE_KEY.to_string()),
        "UPSTREAM_TIMEOUT_SECS" => Some("5".to_string()),
        _ => None,
    })
    .unwrap()
}

pub fn create_test_app(base_url: &str) -> Router {
    build_app(AppState::new(&config_for(base_url)).unwrap())
}

/// Base URL on which nothing is listening.
pub fn unreachable_base_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}")
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

pub async fn send(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();

    TestResponse { status, headers, body }
}

pub fn post_json(uri: &str, body: impl Into<String>) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.into()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}
