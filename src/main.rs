//! event-hub server entry point.
//!
//! Starts the Axum server with the WebSocket endpoint and the background
//! liveness reaper.

use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing_subscriber::EnvFilter;

use event_hub::app_state::AppState;
use event_hub::build_app;
use event_hub::config::{HubConfig, LogFormat};
use event_hub::domain::ConnectionRegistry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = HubConfig::from_env().context("loading configuration")?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }

    tracing::info!(addr = %config.listen_addr, path = %config.ws_path, "starting event-hub");

    let registry = Arc::new(ConnectionRegistry::new());
    let state = AppState::new(registry);

    let reaper_task = config.reap_interval.map(|period| {
        tracing::info!(period_secs = period.as_secs(), "periodic liveness sweep enabled");
        state.reaper.spawn_periodic(period)
    });

    let app = build_app(state, &config.ws_path);

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving")?;

    if let Some(task) = reaper_task {
        task.abort();
    }
    tracing::info!("event-hub stopped");

    Ok(())
}

/// Resolves on Ctrl-C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
