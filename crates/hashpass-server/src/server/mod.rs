//! HTTP server wiring.
//!
//! ## Structure
//!
//! - [`config`] - CLI/env configuration.
//! - [`routes`] - axum router and handlers.
//! - [`telemetry`] - logging and optional metrics.
//!
//! Shutdown is driven entirely by [`HashService`]: a `GET /shutdown`, Ctrl+C
//! or SIGTERM all call [`HashService::initiate_shutdown`], and the listener is
//! closed once [`HashService::stopped`] resolves.

pub mod config;
pub mod routes;
pub mod telemetry;

use anyhow::Context;
use hashpass::HashService;
use tokio::{net::TcpListener, signal};

/// Serves the hashing API on `listener` until the service finishes draining.
///
/// # Errors
///
/// Fails if the listener cannot be served or closed cleanly.
pub async fn serve(listener: TcpListener, service: HashService) -> anyhow::Result<()> {
    let app = routes::router(service.clone());

    axum::serve(listener, app)
        .with_graceful_shutdown(service.stopped())
        .await
        .context("HTTP server terminated with an error")?;

    tracing::info!("Server shut down successfully");
    Ok(())
}

/// Waits for Ctrl+C or SIGTERM and starts the same drain `GET /shutdown`
/// would. Returns early, without shutting down, if the handlers cannot be
/// installed.
pub async fn shutdown_on_signal(service: HashService) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received Ctrl+C signal"),
        () = terminate => tracing::info!("Received SIGTERM signal"),
        () = service.stopped() => return,
    }

    tracing::info!("Shutdown signal received, draining gracefully...");
    service.initiate_shutdown();
}
