use anyhow::Result;
use axum::{Router, middleware};
use tokio::{net::TcpListener, sync::watch};
use tower_http::trace::TraceLayer;
use tracing::info;

use super::middleware::enforce_cors;
use super::routes::create_router;
use crate::config::Config;
use crate::state::AppState;

/// Routes behind the CORS gate, wrapped in request tracing.
pub fn build_app(state: AppState) -> Router {
    create_router()
        .layer(middleware::from_fn_with_state(state.clone(), enforce_cors))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_server(config: Config, shutdown_rx: watch::Receiver<bool>) -> Result<()> {
    let address = config.bind_address();
    let state = AppState::new(&config)?;
    let app = build_app(state);

    info!("Binding to {address}");
    let listener = TcpListener::bind(&address).await?;
    info!("Relay listening on http://{address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_rx))
        .await?;

    Ok(())
}

async fn shutdown_signal(mut shutdown_rx: watch::Receiver<bool>) {
    while !*shutdown_rx.borrow() {
        if shutdown_rx.changed().await.is_err() {
            break;
        }
    }
    info!("Shutting down API server...");
}
