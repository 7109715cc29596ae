//! Stream quality selection and its mapping to yt-dlp format selectors.

use std::fmt;
use std::str::FromStr;

/// Format filter requiring both an audio and a video track
const COMBINED: &str = "[acodec!=none][vcodec!=none]";

/// Format filter requiring an audio track and no video
const AUDIO_ONLY: &str = "[acodec!=none][vcodec=none]";

/// Which tracks a stream must carry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamFilter {
    AudioOnly,
    AudioAndVideo,
}

/// Requested stream quality
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Quality {
    #[default]
    Highest,
    Lowest,
    HighestAudio,
    LowestAudio,
    HighestVideo,
    LowestVideo,
    /// A specific platform format number
    Itag(u32),
    /// Anything else is handed to the client as-is
    Format(String),
}

impl Quality {
    /// Parse an optional query value, treating absent or blank as `Highest`
    pub fn from_param(param: Option<&str>) -> Self {
        match param.map(str::trim) {
            None | Some("") => Quality::Highest,
            Some(s) => s.parse().unwrap_or_default(),
        }
    }

    /// yt-dlp `-f` selector for this quality under `filter`.
    ///
    /// The quality only ranks formats; the filter decides which tracks every
    /// candidate must carry. Under `AudioAndVideo` each selector keeps both
    /// codecs present.
    pub fn format_selector(&self, filter: StreamFilter) -> String {
        use Quality::*;
        use StreamFilter::*;

        match (self, filter) {
            (Highest, AudioAndVideo) => "best[acodec!=none][vcodec!=none]".to_string(),
            (Lowest, AudioAndVideo) => "worst[acodec!=none][vcodec!=none]".to_string(),
            (HighestAudio, AudioAndVideo) => "ba*[vcodec!=none]".to_string(),
            (LowestAudio, AudioAndVideo) => "wa*[vcodec!=none]".to_string(),
            (HighestVideo, AudioAndVideo) => "bv*[acodec!=none]".to_string(),
            (LowestVideo, AudioAndVideo) => "wv*[acodec!=none]".to_string(),
            (Itag(n), AudioAndVideo) => format!("{}{}", n, COMBINED),
            (Format(s), AudioAndVideo) => format!("({}){}", s, COMBINED),
            (Itag(n), AudioOnly) => format!("{}{}", n, AUDIO_ONLY),
            (Format(s), AudioOnly) => format!("({}){}", s, AUDIO_ONLY),
            (Lowest | LowestAudio, AudioOnly) => "worstaudio".to_string(),
            (Highest | HighestAudio | HighestVideo | LowestVideo, AudioOnly) => {
                "bestaudio".to_string()
            }
        }
    }
}

impl FromStr for Quality {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "highest" => Quality::Highest,
            "lowest" => Quality::Lowest,
            "highestaudio" => Quality::HighestAudio,
            "lowestaudio" => Quality::LowestAudio,
            "highestvideo" => Quality::HighestVideo,
            "lowestvideo" => Quality::LowestVideo,
            other => match other.parse::<u32>() {
                Ok(n) => Quality::Itag(n),
                Err(_) => Quality::Format(s.to_string()),
            },
        })
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quality::Highest => f.write_str("highest"),
            Quality::Lowest => f.write_str("lowest"),
            Quality::HighestAudio => f.write_str("highestaudio"),
            Quality::LowestAudio => f.write_str("lowestaudio"),
            Quality::HighestVideo => f.write_str("highestvideo"),
            Quality::LowestVideo => f.write_str("lowestvideo"),
            Quality::Itag(n) => write!(f, "{}", n),
            Quality::Format(s) => f.write_str(s),
        }
    }
}

/// What to open from the source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamRequest {
    pub quality: Quality,
    pub filter: StreamFilter,
}

impl StreamRequest {
    /// Best audio-only stream, the input for MP3 conversion
    pub fn audio_only() -> Self {
        Self {
            quality: Quality::HighestAudio,
            filter: StreamFilter::AudioOnly,
        }
    }

    /// Combined audio and video stream at `quality`
    pub fn combined(quality: Quality) -> Self {
        Self {
            quality,
            filter: StreamFilter::AudioAndVideo,
        }
    }

    pub fn format_selector(&self) -> String {
        self.quality.format_selector(self.filter)
    }
}
