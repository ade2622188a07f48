//! Whisper speech-to-text API server.
//!
//! This is the entry point for the server. It parses the command-line
//! configuration, loads the Whisper model once, and serves the
//! OpenAI-compatible transcription API until shutdown.

use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::fmt;

use whisper_api_server::{
    asr::WhisperTranscriber,
    config::Config,
    error::Result,
    server::{create_router, AppState},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    fmt()
        .with_target(false)
        .with_level(true)
        .json()
        .init();

    // Load configuration
    let config = Config::load()?;

    // Load the model; a server without a usable model has no degraded mode.
    let engine = match WhisperTranscriber::load(&config).await {
        Ok(engine) => Arc::new(engine),
        Err(e) => {
            error!("Failed to load model: {e}");
            return Err(e);
        }
    };

    // Create application state
    let state = AppState::new(engine, config.descriptor());

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);
    info!("API endpoint: http://{}/v1/audio/transcriptions", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Wait for a shutdown signal.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down");
        },
    }
}
