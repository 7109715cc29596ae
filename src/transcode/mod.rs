//! Audio transcoding
//!
//! Turns a source media stream into an MP3 stream. The work is done by an
//! external encoder; see [`ffmpeg::FfmpegTranscoder`].

pub mod ffmpeg;

use crate::error::TranscodeError;
use crate::stream::ByteStream;

pub use ffmpeg::FfmpegTranscoder;

/// Converts a media byte stream to MP3
pub trait Transcoder: Send + Sync {
    /// Start converting `input`.
    ///
    /// Returns as soon as the pipeline is running; encoder failures after that
    /// point show up as `Err` items on the returned stream.
    fn to_mp3(&self, input: ByteStream) -> Result<ByteStream, TranscodeError>;

    /// Output bitrate in kbps
    fn bitrate_kbps(&self) -> u32;
}
