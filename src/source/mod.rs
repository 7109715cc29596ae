//! Video platform client
//!
//! This module handles everything that talks to the video platform:
//! - URL validation and video ID extraction
//! - Metadata lookup (title, formats)
//! - Opening downloadable byte streams at a given quality
//!
//! The platform is reached through the [`VideoSource`] trait so the HTTP
//! layer does not care which client backs it.

pub mod info;
pub mod quality;
pub mod video_url;
pub mod ytdlp;

use async_trait::async_trait;

use crate::error::SourceError;
use crate::stream::ByteStream;

pub use info::VideoInfo;
pub use quality::{Quality, StreamRequest};
pub use video_url::VideoId;
pub use ytdlp::YtDlpSource;

/// A client able to look up and download videos
#[async_trait]
pub trait VideoSource: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Check that `url` points at a video. Must not touch the network.
    fn validate_url(&self, url: &str) -> Result<VideoId, SourceError> {
        video_url::parse_video_url(url)
    }

    /// Fetch metadata for the video at `url`
    async fn fetch_info(&self, url: &str) -> Result<VideoInfo, SourceError>;

    /// Open a byte stream for `info` matching `request`
    async fn open_stream(
        &self,
        info: &VideoInfo,
        request: &StreamRequest,
    ) -> Result<ByteStream, SourceError>;
}
