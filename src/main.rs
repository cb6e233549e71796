// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Nudge notify service
//!
//! Runs the smart-notification pipeline in the background and serves the
//! local control surface used by the platform shell.

use nudge_notify::{config::Config, AppState};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(
        port = config.port,
        backend = %config.backend_base_url,
        user_id = %config.user_id,
        "Starting nudge-notify"
    );

    let shutdown = CancellationToken::new();
    let state = AppState::new(config.clone(), shutdown.clone())?;

    if state.scheduler.start_location_checks().await {
        tracing::info!(
            interval_secs = config.check_interval.as_secs(),
            flex_secs = config.check_flex.as_secs(),
            "Location checks scheduled"
        );
    }

    // Build router
    let app = nudge_notify::routes::create_router(state.clone());

    // Start server
    let addr = format!("127.0.0.1:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    let signal = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
            tracing::info!("Shutdown signal received");
            signal.cancel();
        })
        .await?;

    state.scheduler.stop_location_checks().await;
    shutdown.cancel();
    tracing::info!("Shutdown complete");
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("nudge_notify=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
