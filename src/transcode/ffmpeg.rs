//! MP3 transcoding through the `ffmpeg` executable.

use futures_util::stream::{self, StreamExt};
use std::io;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::{ChildStdin, Command};
use tokio::sync::oneshot;

use super::Transcoder;
use crate::config::TranscodeConfig;
use crate::error::TranscodeError;
use crate::process::spawn_streaming;
use crate::stream::ByteStream;

const TOOL: &str = "ffmpeg";

/// Pipes input through `ffmpeg ... -f mp3 pipe:1`
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    program: PathBuf,
    bitrate_kbps: u32,
}

impl FfmpegTranscoder {
    pub fn new(config: &TranscodeConfig) -> Self {
        Self {
            program: config.ffmpeg_path.clone(),
            bitrate_kbps: config.audio_bitrate_kbps,
        }
    }

    fn mp3_args(&self) -> Vec<String> {
        vec![
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-i".to_string(),
            "pipe:0".to_string(),
            "-vn".to_string(),
            "-b:a".to_string(),
            format!("{}k", self.bitrate_kbps),
            "-f".to_string(),
            "mp3".to_string(),
            "pipe:1".to_string(),
        ]
    }
}

impl Transcoder for FfmpegTranscoder {
    fn to_mp3(&self, input: ByteStream) -> Result<ByteStream, TranscodeError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(self.mp3_args()).stdin(Stdio::piped());

        let child = spawn_streaming(TOOL, &mut cmd)
            .map_err(|e| TranscodeError::Spawn(format!("{}: {}", self.program.display(), e)))?;
        let stdin = child
            .stdin
            .ok_or_else(|| TranscodeError::Spawn("stdin not captured".to_string()))?;

        let (input_failed_tx, input_failed) = oneshot::channel();
        tokio::spawn(feed(input, stdin, input_failed_tx));

        Ok(surface_input_error(child.output, input_failed))
    }

    fn bitrate_kbps(&self) -> u32 {
        self.bitrate_kbps
    }
}

/// Copy `input` into ffmpeg's stdin chunk by chunk.
///
/// A failed input is reported on `input_failed` before stdin is closed, so
/// by the time ffmpeg sees EOF the failure is already recorded.
async fn feed(
    mut input: ByteStream,
    mut stdin: ChildStdin,
    input_failed: oneshot::Sender<io::Error>,
) {
    let mut fed = 0u64;
    while let Some(item) = input.next().await {
        match item {
            Ok(chunk) => {
                if let Err(e) = stdin.write_all(&chunk).await {
                    tracing::debug!("{} closed its input early: {}", TOOL, e);
                    return;
                }
                fed += chunk.len() as u64;
            }
            Err(e) => {
                tracing::debug!(fed, "Transcoder input failed: {}", e);
                let _ = input_failed.send(e);
                return;
            }
        }
    }
    tracing::debug!("Fed {} bytes to {}", fed, TOOL);
}

/// End the transcoded stream with the input's error when the input failed.
///
/// Checked once ffmpeg's output ends or fails. A source error takes
/// precedence over whatever ffmpeg made of its truncated input.
fn surface_input_error(
    output: ByteStream,
    input_failed: oneshot::Receiver<io::Error>,
) -> ByteStream {
    stream::unfold(Some((output, input_failed)), |state| async move {
        let (mut output, mut input_failed) = state?;
        match output.next().await {
            Some(Ok(chunk)) => Some((Ok(chunk), Some((output, input_failed)))),
            end => match input_failed.try_recv() {
                Ok(e) => Some((Err(e), None)),
                Err(_) => end.map(|item| (item, None)),
            },
        }
    })
    .boxed()
}
