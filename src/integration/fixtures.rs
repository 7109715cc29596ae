//! Test fixtures for integration tests
//!
//! In-memory stand-ins for the platform client and the transcoder, so the
//! router can be exercised without network access or external binaries.

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::{self, StreamExt};
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::config::ServerConfig;
use crate::error::{SourceError, TranscodeError};
use crate::source::{StreamRequest, VideoInfo, VideoSource};
use crate::state::AppState;
use crate::stream::ByteStream;
use crate::transcode::Transcoder;

pub const VIDEO_URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";
pub const VIDEO_ID: &str = "dQw4w9WgXcQ";

fn failing(message: &str) -> ByteStream {
    let err = io::Error::new(io::ErrorKind::Other, message.to_string());
    stream::iter(vec![Err(err)]).boxed()
}

/// Platform client that serves a fixed payload
pub struct FakeSource {
    pub title: String,
    pub payload: Vec<u8>,
    pub info_error: Option<String>,
    pub stream_error: Option<String>,
    /// Fail after the first half of the payload instead of at the start
    pub fail_midway: bool,
    pub fetch_calls: AtomicUsize,
    pub fetched: Mutex<Vec<String>>,
    pub opened: Mutex<Vec<StreamRequest>>,
}

impl FakeSource {
    pub fn new(title: &str, payload: &[u8]) -> Self {
        Self {
            title: title.to_string(),
            payload: payload.to_vec(),
            info_error: None,
            stream_error: None,
            fail_midway: false,
            fetch_calls: AtomicUsize::new(0),
            fetched: Mutex::new(Vec::new()),
            opened: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_info(message: &str) -> Self {
        Self {
            info_error: Some(message.to_string()),
            ..Self::new("unused", b"")
        }
    }

    pub fn failing_stream(message: &str) -> Self {
        Self {
            stream_error: Some(message.to_string()),
            ..Self::new("Broken Stream", b"")
        }
    }

    /// Serves the first half of `payload`, then fails with `message`
    pub fn failing_midway(payload: &[u8], message: &str) -> Self {
        Self {
            stream_error: Some(message.to_string()),
            fail_midway: true,
            ..Self::new("Broken Stream", payload)
        }
    }

    pub fn fetch_count(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn fetched_urls(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }

    pub fn opened_requests(&self) -> Vec<StreamRequest> {
        self.opened.lock().unwrap().clone()
    }
}

#[async_trait]
impl VideoSource for FakeSource {
    fn name(&self) -> &str {
        "fake"
    }

    async fn fetch_info(&self, url: &str) -> Result<VideoInfo, SourceError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.fetched.lock().unwrap().push(url.to_string());
        if let Some(message) = &self.info_error {
            return Err(SourceError::Metadata(message.clone()));
        }
        Ok(VideoInfo {
            id: VIDEO_ID.to_string(),
            title: self.title.clone(),
            source_url: url.to_string(),
            duration_secs: Some(212.0),
            uploader: Some("Fake Uploader".to_string()),
            formats: Vec::new(),
        })
    }

    async fn open_stream(
        &self,
        _info: &VideoInfo,
        request: &StreamRequest,
    ) -> Result<ByteStream, SourceError> {
        self.opened.lock().unwrap().push(request.clone());
        let mid = self.payload.len() / 2;
        if let Some(message) = &self.stream_error {
            if self.fail_midway {
                let head = stream::iter(vec![Ok(Bytes::copy_from_slice(&self.payload[..mid]))]);
                return Ok(head.chain(failing(message)).boxed());
            }
            return Ok(failing(message));
        }
        // Two chunks, so piping across chunk boundaries is exercised
        let chunks = vec![
            Ok(Bytes::copy_from_slice(&self.payload[..mid])),
            Ok(Bytes::copy_from_slice(&self.payload[mid..])),
        ];
        Ok(stream::iter(chunks).boxed())
    }
}

/// How the fake transcoder behaves
#[derive(Debug, Clone)]
pub enum FakeTranscode {
    /// Prefix the input with `MP3:`
    Prefix,
    /// Fail before producing any output
    FailEarly(String),
    /// Produce some output, then fail
    FailLate(String),
    /// Fail to start at all
    SpawnError(String),
}

pub struct FakeTranscoder {
    pub mode: FakeTranscode,
}

impl Transcoder for FakeTranscoder {
    fn to_mp3(&self, input: ByteStream) -> Result<ByteStream, TranscodeError> {
        match &self.mode {
            FakeTranscode::Prefix => {
                let head = stream::iter(vec![Ok(Bytes::from_static(b"MP3:"))]);
                Ok(head.chain(input).boxed())
            }
            FakeTranscode::FailEarly(message) => Ok(failing(message)),
            FakeTranscode::FailLate(message) => {
                let head = stream::iter(vec![Ok(Bytes::from_static(b"partial"))]);
                Ok(head.chain(failing(message)).boxed())
            }
            FakeTranscode::SpawnError(message) => Err(TranscodeError::Spawn(message.clone())),
        }
    }

    fn bitrate_kbps(&self) -> u32 {
        128
    }
}

/// App state wired to the fakes, serving static files from `static_dir`
pub fn test_state(
    source: Arc<FakeSource>,
    mode: FakeTranscode,
    static_dir: &Path,
) -> Arc<AppState> {
    test_state_with_transcoder(source, Arc::new(FakeTranscoder { mode }), static_dir)
}

pub fn test_state_with_transcoder(
    source: Arc<FakeSource>,
    transcoder: Arc<dyn Transcoder>,
    static_dir: &Path,
) -> Arc<AppState> {
    let config = ServerConfig {
        static_dir: static_dir.to_path_buf(),
        ..Default::default()
    };
    Arc::new(AppState::with_backends(config, source, transcoder))
}

/// Executable stand-in for ffmpeg that copies stdin to stdout, written into
/// `dir`
#[cfg(unix)]
pub fn passthrough_ffmpeg(dir: &Path) -> std::path::PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("ffmpeg");
    std::fs::write(&path, "#!/bin/sh\ncat\n").unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}
