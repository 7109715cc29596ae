//! Application state management
//!
//! This module defines the AppState structure that holds:
//! - Server configuration
//! - The video platform client
//! - The MP3 transcoder
//! - Download counters

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::config::ServerConfig;
use crate::source::{VideoSource, YtDlpSource};
use crate::transcode::{FfmpegTranscoder, Transcoder};

/// Counters for downloads handled since startup
#[derive(Debug, Default)]
pub struct DownloadStats {
    active: AtomicU64,
    started: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
}

/// Point-in-time copy of [`DownloadStats`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DownloadStatsSnapshot {
    pub active: u64,
    pub started: u64,
    pub completed: u64,
    pub failed: u64,
}

impl DownloadStats {
    /// Register a new download. It counts as failed unless the returned
    /// guard is marked complete before it is dropped.
    pub fn start(self: &Arc<Self>) -> DownloadGuard {
        self.started.fetch_add(1, Ordering::Relaxed);
        self.active.fetch_add(1, Ordering::Relaxed);
        DownloadGuard {
            stats: Arc::clone(self),
            completed: false,
        }
    }

    pub fn snapshot(&self) -> DownloadStatsSnapshot {
        DownloadStatsSnapshot {
            active: self.active.load(Ordering::Relaxed),
            started: self.started.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// Tracks one in-flight download
#[derive(Debug)]
pub struct DownloadGuard {
    stats: Arc<DownloadStats>,
    completed: bool,
}

impl DownloadGuard {
    pub fn complete(mut self) {
        self.completed = true;
    }
}

impl Drop for DownloadGuard {
    fn drop(&mut self) {
        self.stats.active.fetch_sub(1, Ordering::Relaxed);
        let counter = if self.completed {
            &self.stats.completed
        } else {
            &self.stats.failed
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Shared application state
pub struct AppState {
    pub config: ServerConfig,
    pub source: Arc<dyn VideoSource>,
    pub transcoder: Arc<dyn Transcoder>,
    pub downloads: Arc<DownloadStats>,
}

impl AppState {
    /// Build state backed by yt-dlp and ffmpeg
    pub fn new(config: ServerConfig) -> Self {
        let source = Arc::new(YtDlpSource::new(&config.source));
        let transcoder = Arc::new(FfmpegTranscoder::new(&config.transcode));
        Self::with_backends(config, source, transcoder)
    }

    /// Build state around the given client and transcoder
    pub fn with_backends(
        config: ServerConfig,
        source: Arc<dyn VideoSource>,
        transcoder: Arc<dyn Transcoder>,
    ) -> Self {
        Self {
            config,
            source,
            transcoder,
            downloads: Arc::new(DownloadStats::default()),
        }
    }
}
