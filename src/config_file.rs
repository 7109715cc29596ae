//! Configuration file support
//!
//! Loads server configuration from TOML files. Every field is optional and
//! falls back to the value in [`ServerConfig::default`].

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::{ServerConfig, SourceConfig, TranscodeConfig};

/// Configuration file format
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Server settings
    #[serde(default)]
    pub server: ServerSettings,
    /// Video platform client settings
    #[serde(default)]
    pub source: SourceSettings,
    /// Transcoder settings
    #[serde(default)]
    pub transcode: TranscodeSettings,
    /// Logging settings
    pub logging: Option<LoggingSettings>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Host address to bind to
    pub host: Option<String>,
    /// First port to try
    pub port: Option<u16>,
    /// Number of ports to probe
    pub max_port_attempts: Option<u32>,
    /// Static file directory
    pub static_dir: Option<PathBuf>,
    /// Enable CORS
    pub cors_enabled: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceSettings {
    pub ytdlp_path: Option<PathBuf>,
    pub user_agent: Option<String>,
    pub metadata_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranscodeSettings {
    pub ffmpeg_path: Option<PathBuf>,
    pub audio_bitrate_kbps: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Output format (json, pretty)
    pub format: Option<String>,
}

impl ConfigFile {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: ConfigFile = toml::from_str(&content)?;
        Ok(config)
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Generate default configuration file
    pub fn default_config() -> Self {
        let defaults = ServerConfig::default();
        Self {
            server: ServerSettings {
                host: Some(defaults.host),
                port: Some(defaults.start_port),
                max_port_attempts: Some(defaults.max_port_attempts),
                static_dir: Some(defaults.static_dir),
                cors_enabled: Some(defaults.cors_enabled),
            },
            source: SourceSettings {
                ytdlp_path: Some(defaults.source.ytdlp_path),
                user_agent: Some(defaults.source.user_agent),
                metadata_timeout_secs: Some(defaults.source.metadata_timeout_secs),
            },
            transcode: TranscodeSettings {
                ffmpeg_path: Some(defaults.transcode.ffmpeg_path),
                audio_bitrate_kbps: Some(defaults.transcode.audio_bitrate_kbps),
            },
            logging: Some(LoggingSettings {
                level: defaults.log_level,
                format: Some(defaults.log_format),
            }),
        }
    }

    /// Convert to ServerConfig
    pub fn into_server_config(self) -> ServerConfig {
        let defaults = ServerConfig::default();
        let (log_level, log_format) = match self.logging {
            Some(l) => (l.level, l.format.unwrap_or(defaults.log_format)),
            None => (defaults.log_level, defaults.log_format),
        };

        ServerConfig {
            host: self.server.host.unwrap_or(defaults.host),
            start_port: self.server.port.unwrap_or(defaults.start_port),
            max_port_attempts: self
                .server
                .max_port_attempts
                .unwrap_or(defaults.max_port_attempts),
            static_dir: self.server.static_dir.unwrap_or(defaults.static_dir),
            cors_enabled: self.server.cors_enabled.unwrap_or(defaults.cors_enabled),
            log_level,
            log_format,
            source: SourceConfig {
                ytdlp_path: self.source.ytdlp_path.unwrap_or(defaults.source.ytdlp_path),
                user_agent: self.source.user_agent.unwrap_or(defaults.source.user_agent),
                metadata_timeout_secs: self
                    .source
                    .metadata_timeout_secs
                    .unwrap_or(defaults.source.metadata_timeout_secs),
            },
            transcode: TranscodeConfig {
                ffmpeg_path: self
                    .transcode
                    .ffmpeg_path
                    .unwrap_or(defaults.transcode.ffmpeg_path),
                audio_bitrate_kbps: self
                    .transcode
                    .audio_bitrate_kbps
                    .unwrap_or(defaults.transcode.audio_bitrate_kbps),
            },
        }
    }
}

/// Load the server configuration from `path`.
///
/// A missing file yields the defaults. A file that exists but cannot be
/// read or parsed is an error.
pub fn load<P: AsRef<Path>>(path: P) -> Result<ServerConfig, Box<dyn std::error::Error>> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(ServerConfig::default());
    }
    Ok(ConfigFile::from_file(path)?.into_server_config())
}
