use anyhow::Result;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use relay_engine::{Config, api};

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        // A missing .env is normal in deployment; the real environment still applies.
        if !e.not_found() {
            eprintln!("Failed to read .env: {e}");
        }
    }

    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;
    info!(
        origins = config.allowed_origins.len(),
        model = %config.chat.model,
        "Starting relay"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut api_handle = tokio::spawn(api::start_server(config, shutdown_rx));

    tokio::select! {
        _ = wait_for_shutdown() => {
            info!("Received shutdown signal...");
            let _ = shutdown_tx.send(true);
            api_handle.await??;
        }
        result = &mut api_handle => {
            // Server stopped without being asked to, usually a bind failure.
            if let Err(e) = result? {
                error!("API server crashed: {e:#}");
                return Err(e);
            }
        }
    }

    info!("Relay shutdown complete.");
    Ok(())
}

async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
