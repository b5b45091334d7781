//! `saga serve` - chat and MCP over HTTP.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use saga_core::SagaConfig;
use saga_server::{bootstrap, build_router};
use tokio::net::TcpListener;
use tracing::info;

pub async fn run(config_path: Option<&Path>, bind: Option<String>) -> Result<()> {
    let config = SagaConfig::load(config_path).context("failed to load configuration")?;
    let state = bootstrap::build_state(&config)?;
    let bind = bind.unwrap_or_else(|| config.server.bind.clone());

    info!(
        bind = %bind,
        schema = %config.store.schema,
        auth = state.auth.is_some(),
        mcp = state.mcp_enabled,
        mcp_gated = state.mcp_gated(),
        turn_timeout_secs = state.turn_timeout.as_secs(),
        "starting saga"
    );

    let app = build_router(Arc::new(state));
    let listener = TcpListener::bind(&bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    info!(addr = %listener.local_addr()?, "listening (Ctrl+C/SIGTERM to stop)");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("saga stopped");
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "cannot listen for SIGTERM");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
