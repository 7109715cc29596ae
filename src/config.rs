//! Server configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// User agent sent to the video platform
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/93.0.4577.63 Safari/537.36";

/// Video platform client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Path or name of the yt-dlp executable
    pub ytdlp_path: PathBuf,

    /// User agent forwarded to the platform on every request
    pub user_agent: String,

    /// Upper bound for a metadata lookup in seconds
    pub metadata_timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            ytdlp_path: PathBuf::from("yt-dlp"),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            metadata_timeout_secs: 60,
        }
    }
}

impl SourceConfig {
    pub fn metadata_timeout(&self) -> Duration {
        Duration::from_secs(self.metadata_timeout_secs)
    }
}

/// Audio transcoding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscodeConfig {
    /// Path or name of the ffmpeg executable
    pub ffmpeg_path: PathBuf,

    /// MP3 bitrate in kbps
    pub audio_bitrate_kbps: u32,
}

impl Default for TranscodeConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: PathBuf::from("ffmpeg"),
            audio_bitrate_kbps: 128,
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    pub host: String,

    /// First port tried by the bootstrap probe
    pub start_port: u16,

    /// How many consecutive ports to try before giving up
    pub max_port_attempts: u32,

    /// Directory served at the web root
    pub static_dir: PathBuf,

    /// Enable CORS
    pub cors_enabled: bool,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Log output format (pretty, json)
    pub log_format: String,

    /// Video platform client configuration
    pub source: SourceConfig,

    /// Transcoder configuration
    pub transcode: TranscodeConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            start_port: 3000,
            max_port_attempts: 100,
            static_dir: PathBuf::from("public"),
            cors_enabled: true,
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            source: SourceConfig::default(),
            transcode: TranscodeConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Whether logs should be emitted as JSON lines
    pub fn json_logs(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }
}
