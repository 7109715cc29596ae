//! Video metadata as reported by the platform client.

use serde::Deserialize;

use crate::error::SourceError;

/// One downloadable format of a video
#[derive(Debug, Clone, PartialEq)]
pub struct FormatInfo {
    pub format_id: String,
    pub ext: String,
    pub has_audio: bool,
    pub has_video: bool,
    /// Audio bitrate in kbps
    pub abr: Option<f64>,
    pub height: Option<u32>,
}

/// Metadata for a single video
#[derive(Debug, Clone, PartialEq)]
pub struct VideoInfo {
    pub id: String,
    pub title: String,
    /// Canonical page URL, used when opening streams
    pub source_url: String,
    pub duration_secs: Option<f64>,
    pub uploader: Option<String>,
    pub formats: Vec<FormatInfo>,
}

impl VideoInfo {
    /// Formats that carry both audio and video
    pub fn combined_formats(&self) -> impl Iterator<Item = &FormatInfo> {
        self.formats.iter().filter(|f| f.has_audio && f.has_video)
    }

    /// Formats that carry audio and no video
    pub fn audio_formats(&self) -> impl Iterator<Item = &FormatInfo> {
        self.formats.iter().filter(|f| f.has_audio && !f.has_video)
    }
}

// yt-dlp `-J` output, only the fields we read

#[derive(Debug, Deserialize)]
struct RawInfo {
    id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    webpage_url: Option<String>,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    uploader: Option<String>,
    #[serde(default)]
    formats: Vec<RawFormat>,
}

#[derive(Debug, Deserialize)]
struct RawFormat {
    format_id: String,
    #[serde(default)]
    ext: Option<String>,
    #[serde(default)]
    acodec: Option<String>,
    #[serde(default)]
    vcodec: Option<String>,
    #[serde(default)]
    abr: Option<f64>,
    #[serde(default)]
    height: Option<u32>,
}

/// yt-dlp reports a missing track as the string "none"
fn has_codec(codec: &Option<String>) -> bool {
    matches!(codec.as_deref(), Some(c) if c != "none")
}

impl From<RawFormat> for FormatInfo {
    fn from(raw: RawFormat) -> Self {
        Self {
            has_audio: has_codec(&raw.acodec),
            has_video: has_codec(&raw.vcodec),
            format_id: raw.format_id,
            ext: raw.ext.unwrap_or_default(),
            abr: raw.abr,
            height: raw.height,
        }
    }
}

/// Parse the JSON document printed by `yt-dlp -J`.
///
/// `requested_url` is used when the document carries no page URL.
pub fn parse_info_json(json: &[u8], requested_url: &str) -> Result<VideoInfo, SourceError> {
    let raw: RawInfo =
        serde_json::from_slice(json).map_err(|e| SourceError::Metadata(e.to_string()))?;

    Ok(VideoInfo {
        title: raw.title.unwrap_or_else(|| raw.id.clone()),
        id: raw.id,
        source_url: raw
            .webpage_url
            .unwrap_or_else(|| requested_url.to_string()),
        duration_secs: raw.duration,
        uploader: raw.uploader,
        formats: raw.formats.into_iter().map(FormatInfo::from).collect(),
    })
}
