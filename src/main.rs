//! Video Download Server
//!
//! Streams videos from the platform as MP4 downloads, or converts their
//! audio to MP3 on the fly. Metadata and media come from `yt-dlp`; MP3
//! encoding is done by `ffmpeg`.

mod bootstrap;
mod config;
mod config_file;
mod error;
mod http;
mod media;
mod process;
mod source;
mod state;
mod stream;
mod transcode;

#[cfg(test)]
mod integration;

use std::sync::Arc;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::ServerConfig;
use crate::error::{Result, ServerError};
use crate::http::create_router;
use crate::state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
const APP_NAME: &str = "tube-dl-server";

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());
    if config_path == "--print-config" {
        let toml = config_file::ConfigFile::default_config()
            .to_toml()
            .map_err(|e| ServerError::Config(e.to_string()))?;
        print!("{}", toml);
        return Ok(());
    }
    let (config, config_error) = match config_file::load(&config_path) {
        Ok(config) => (config, None),
        Err(e) => (
            ServerConfig::default(),
            Some(ServerError::Config(format!("{}: {}", config_path, e))),
        ),
    };

    // Initialize logging
    init_logging(&config);

    tracing::info!("{} v{} starting", APP_NAME, VERSION);
    if let Some(e) = config_error {
        tracing::warn!("{}. Using defaults.", e);
    }
    tracing::info!("Configuration loaded: {:?}", config);

    check_tools(&config);

    // Create application state
    let state = Arc::new(AppState::new(config.clone()));
    tracing::info!(
        "Source: {}, MP3 bitrate: {} kbps",
        state.source.name(),
        state.transcoder.bitrate_kbps()
    );

    // Build router
    let app = create_router(state);

    // Start server
    let (listener, port) = match bootstrap::bind_first_available(
        &config.host,
        config.start_port,
        config.max_port_attempts,
    )
    .await
    {
        Ok(bound) => bound,
        Err(e) => {
            tracing::error!("Failed to start server: {}", e);
            return Err(e.into());
        }
    };

    tracing::info!("Listening on {}:{}", config.host, port);
    println!("Server running on http://localhost:{}", port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Initialize logging with tracing
fn init_logging(config: &ServerConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("tube_dl_server={},tower_http=info", config.log_level).into()
    });
    let registry = tracing_subscriber::registry().with(filter);

    if config.json_logs() {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Warn early about external tools that cannot be found. Requests that need
/// a missing tool fail on their own; startup carries on.
fn check_tools(config: &ServerConfig) {
    let tools = [
        ("yt-dlp", &config.source.ytdlp_path),
        ("ffmpeg", &config.transcode.ffmpeg_path),
    ];
    for (name, path) in tools {
        match which::which(path) {
            Ok(resolved) => tracing::info!("Using {} at {}", name, resolved.display()),
            Err(e) => tracing::warn!("{} not found ({}): {}", name, path.display(), e),
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
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
                tracing::error!("Failed to install SIGTERM handler: {}", e);
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

    tracing::info!("Shutdown signal received");
}
