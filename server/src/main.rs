//! FeedbackPulse server.
//!
//! Serves the public widget submission endpoint and the dashboard API, and
//! delivers signed webhooks in the background.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use feedbackpulse::{build_router, AppState, Config, SentimentClient, Store, WebhookClient};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("server_starting");

    // Load configuration
    let config = Config::from_env();
    info!(
        port = config.port,
        frontend_origins = ?config.frontend_origins,
        public_base_url = %config.public_base_url,
        webhook_timeout_ms = config.webhook_timeout_ms,
        sentiment_configured = config.gemini_api_key.is_some(),
        "config_loaded"
    );
    if config.uses_default_jwt_secret() {
        warn!("jwt_secret_is_default");
    }

    // Outbound clients
    let webhooks =
        WebhookClient::new(config.webhook_timeout()).context("Failed to build webhook client")?;
    let http = reqwest::Client::builder()
        .build()
        .context("Failed to build HTTP client")?;
    let sentiment = SentimentClient::new(http, config.gemini_api_key.clone(), &config.gemini_model);

    let state = AppState::new(config.clone(), Store::new(), webhooks, sentiment);
    let app = build_router(state);

    // Bind to address
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "server_listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("server_shutdown_complete");

    Ok(())
}

/// Create a future that completes when a shutdown signal is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "ctrl_c_handler_failed");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "sigterm_handler_failed");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("server_shutting_down");
}
