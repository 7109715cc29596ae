//! Streaming subprocess helpers shared by the source client and the
//! transcoder.
//!
//! A child is spawned with its stdout turned into a [`ByteStream`]. The
//! stream owns the child: dropping it (for example when the HTTP client
//! goes away) kills the process. When stdout reaches EOF the exit status is
//! checked and a non-zero exit is yielded as a final `Err` item carrying the
//! tail of stderr.

use futures_util::stream::{self, StreamExt};
use std::io;
use std::process::Stdio;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{ChildStdin, Command};

use crate::stream::{from_reader, ByteStream};

/// Cap on how much stderr is buffered per child
const STDERR_LIMIT: u64 = 64 * 1024;

/// A running child whose stdout is exposed as a stream
pub struct StreamingChild {
    /// Present when the command was configured with a piped stdin
    pub stdin: Option<ChildStdin>,
    pub output: ByteStream,
}

/// Reduce captured stderr to a one-line message.
///
/// Prefers the last line mentioning an error, otherwise the last non-empty
/// line.
pub fn summarize_stderr(raw: &[u8]) -> String {
    let text = String::from_utf8_lossy(raw);
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    lines
        .iter()
        .rev()
        .find(|l| l.to_ascii_lowercase().contains("error"))
        .or_else(|| lines.last())
        .map(|l| l.to_string())
        .unwrap_or_else(|| "no diagnostic output".to_string())
}

async fn read_capped<R: AsyncRead + Unpin>(reader: R) -> Vec<u8> {
    let mut buf = Vec::new();
    let mut capped = reader.take(STDERR_LIMIT);
    let _ = capped.read_to_end(&mut buf).await;
    // Drain the rest so the child never blocks on a full pipe
    let _ = tokio::io::copy(&mut capped.into_inner(), &mut tokio::io::sink()).await;
    buf
}

/// Spawn `cmd` with piped stdout/stderr and stream its stdout.
///
/// `tool` names the program in error messages.
pub fn spawn_streaming(tool: &'static str, cmd: &mut Command) -> io::Result<StreamingChild> {
    cmd.stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd.spawn()?;
    let stdin = child.stdin.take();
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "stdout not captured"))?;
    let stderr_task = child.stderr.take().map(|e| tokio::spawn(read_capped(e)));

    let tail = stream::once(async move {
        let status = child.wait().await;
        let stderr = match stderr_task {
            Some(task) => task.await.unwrap_or_default(),
            None => Vec::new(),
        };
        match status {
            Ok(s) if s.success() => None,
            Ok(s) => Some(Err(io::Error::new(
                io::ErrorKind::Other,
                format!("{} exited with {}: {}", tool, s, summarize_stderr(&stderr)),
            ))),
            Err(e) => Some(Err(e)),
        }
    })
    .filter_map(|item| async move { item });

    Ok(StreamingChild {
        stdin,
        output: from_reader(stdout).chain(tail).boxed(),
    })
}
