use std::time::Duration;

use tokio::time::timeout;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::http_server;
use crate::{Config, State};

const FINAL_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Wire up logging and state, serve the API until interrupted, then
/// flush credential state on the way out.
pub async fn spawn_service(config: &Config) {
    let (non_blocking_writer, _guard) = tracing_appender::non_blocking(std::io::stdout());
    let env_filter = EnvFilter::builder()
        .with_default_directive(config.log_level.into())
        .from_env_lossy();

    let stderr_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(non_blocking_writer)
        .with_filter(env_filter);

    tracing_subscriber::registry().with(stderr_layer).init();

    let state = match State::from_config(config) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("error creating server state: {}", e);
            std::process::exit(3);
        }
    };

    let (shutdown_tx, mut shutdown_rx) = tokio::sync::watch::channel(());
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received shutdown signal");
        }
        let _ = shutdown_tx.send(());
    });

    let listen_addr = state.listen_addr();
    let api_state = state.clone();
    let log_level = config.log_level;
    let api_rx = shutdown_rx.clone();
    let api_handle = tokio::spawn(async move {
        if let Err(e) = http_server::run(api_state, listen_addr, log_level, api_rx).await {
            tracing::error!("API server error: {}", e);
        }
    });

    // Wait for shutdown, then give the server a bounded window to drain.
    let _ = shutdown_rx.changed().await;

    if timeout(FINAL_SHUTDOWN_TIMEOUT, api_handle).await.is_err() {
        tracing::error!(
            "Failed to shut down within {} seconds",
            FINAL_SHUTDOWN_TIMEOUT.as_secs()
        );
        std::process::exit(4);
    }

    if let Err(e) = state.flush_settings().await {
        tracing::warn!("failed to persist settings on shutdown: {e}");
    }
    tracing::info!("shutdown complete");
}
