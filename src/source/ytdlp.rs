//! [`VideoSource`] backed by the `yt-dlp` executable.
//!
//! Metadata comes from `yt-dlp -J`; streams come from `yt-dlp -o -`, which
//! writes the selected format to stdout.

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use super::info::{parse_info_json, VideoInfo};
use super::quality::StreamRequest;
use super::VideoSource;
use crate::config::SourceConfig;
use crate::error::SourceError;
use crate::process::{spawn_streaming, summarize_stderr};
use crate::stream::ByteStream;

const TOOL: &str = "yt-dlp";

/// yt-dlp driven platform client
#[derive(Debug, Clone)]
pub struct YtDlpSource {
    program: PathBuf,
    user_agent: String,
    metadata_timeout: Duration,
}

impl YtDlpSource {
    pub fn new(config: &SourceConfig) -> Self {
        Self {
            program: config.ytdlp_path.clone(),
            user_agent: config.user_agent.clone(),
            metadata_timeout: config.metadata_timeout(),
        }
    }

    /// Arguments shared by every invocation
    fn base_args(&self) -> Vec<String> {
        vec![
            "--no-playlist".to_string(),
            "--no-warnings".to_string(),
            "--user-agent".to_string(),
            self.user_agent.clone(),
        ]
    }

    fn info_args(&self, url: &str) -> Vec<String> {
        let mut args = self.base_args();
        args.extend(["-J".to_string(), "--".to_string(), url.to_string()]);
        args
    }

    fn stream_args(&self, url: &str, request: &StreamRequest) -> Vec<String> {
        let mut args = self.base_args();
        args.extend([
            "-f".to_string(),
            request.format_selector(),
            "-o".to_string(),
            "-".to_string(),
            "--quiet".to_string(),
            "--".to_string(),
            url.to_string(),
        ]);
        args
    }

    fn spawn_error(&self, e: std::io::Error) -> SourceError {
        SourceError::Spawn {
            tool: TOOL.to_string(),
            message: format!("{}: {}", self.program.display(), e),
        }
    }
}

#[async_trait]
impl VideoSource for YtDlpSource {
    fn name(&self) -> &str {
        TOOL
    }

    async fn fetch_info(&self, url: &str) -> Result<VideoInfo, SourceError> {
        let child = Command::new(&self.program)
            .args(self.info_args(url))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        // Dropping the future on timeout drops the child, which kills it
        let output = tokio::time::timeout(self.metadata_timeout, child.wait_with_output())
            .await
            .map_err(|_| SourceError::Timeout(self.metadata_timeout.as_secs()))??;

        if !output.status.success() {
            return Err(SourceError::ToolFailed {
                tool: TOOL.to_string(),
                status: output.status,
                stderr: summarize_stderr(&output.stderr),
            });
        }

        let info = parse_info_json(&output.stdout, url)?;
        tracing::debug!(
            id = %info.id,
            formats = info.formats.len(),
            combined = info.combined_formats().count(),
            audio_only = info.audio_formats().count(),
            duration = ?info.duration_secs,
            "Fetched video metadata"
        );
        Ok(info)
    }

    async fn open_stream(
        &self,
        info: &VideoInfo,
        request: &StreamRequest,
    ) -> Result<ByteStream, SourceError> {
        tracing::debug!(
            id = %info.id,
            format = %request.format_selector(),
            "Opening source stream"
        );

        let mut cmd = Command::new(&self.program);
        cmd.args(self.stream_args(&info.source_url, request))
            .stdin(Stdio::null());

        let child = spawn_streaming(TOOL, &mut cmd).map_err(|e| self.spawn_error(e))?;
        Ok(child.output)
    }
}
