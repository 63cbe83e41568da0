//! RAIN relay gateway.
//!
//! - Client WebSocket endpoint: /v1/ws
//! - One upstream WebSocket link to the matchmaking peer
//! - Tracing via RUST_LOG
//! - Graceful shutdown on ctrl-c (closes the upstream link last)

use std::process::ExitCode;

use tracing_subscriber::{fmt, EnvFilter};

use rain_relay_core::error::{RelayError, Result};
use rain_relay_gateway::{app_state, config, router};

#[tokio::main]
async fn main() -> ExitCode {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "rain-relay stopped");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let path = config::config_path();
    let cfg = config::load_from_file(&path)?;
    let listen = cfg.gateway.listen_addr()?;

    let (state, upstream) = app_state::AppState::connect(cfg).await?;
    let app = router::build_router(state);

    tracing::info!(%listen, config = %path, "rain-relay starting");
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| RelayError::Internal(format!("bind {listen} failed: {e}")))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| RelayError::Internal(format!("server failed: {e}")))?;

    upstream.disconnect().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "ctrl-c handler unavailable");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
