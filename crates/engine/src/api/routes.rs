use axum::{
    Router,
    routing::{get, post},
};

use super::handlers;
use crate::state::AppState;

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::health_check))
        .route("/ping", get(handlers::ping))
        .route("/chat", post(handlers::handle_chat))
        .route("/submit-suggestion", post(handlers::handle_submit_suggestion))
}
