use std::process::ExitStatus;

use thiserror::Error;

/// Main error type for the download server
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("Transcode error: {0}")]
    Transcode(#[from] TranscodeError),

    #[error("Startup error: {0}")]
    Bootstrap(#[from] BootstrapError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the video platform client
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Invalid video URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to spawn {tool}: {message}")]
    Spawn { tool: String, message: String },

    #[error("{tool} exited with {status}: {stderr}")]
    ToolFailed {
        tool: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("Malformed metadata: {0}")]
    Metadata(String),

    #[error("Metadata request timed out after {0}s")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the transcoding pipeline
#[derive(Error, Debug)]
pub enum TranscodeError {
    #[error("Failed to spawn ffmpeg: {0}")]
    Spawn(String),

    #[error("ffmpeg exited with {status}: {stderr}")]
    Failed { status: ExitStatus, stderr: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while selecting a listening port
#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error("Failed to bind port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("No free port found in {attempts} attempt(s) starting at {start}")]
    Exhausted { start: u16, attempts: u32 },
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, ServerError>;
