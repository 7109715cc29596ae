//! Response media kind and download filename.

use std::fmt;

/// What the client asked to receive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MediaKind {
    /// Audio only, transcoded to MP3
    Mp3,
    /// The platform's combined audio/video stream as-is
    #[default]
    Mp4,
}

impl MediaKind {
    /// `type=mp3` selects MP3; anything else, including nothing, is MP4
    pub fn from_param(param: Option<&str>) -> Self {
        match param {
            Some("mp3") => MediaKind::Mp3,
            _ => MediaKind::Mp4,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            MediaKind::Mp3 => "mp3",
            MediaKind::Mp4 => "mp4",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            MediaKind::Mp3 => "audio/mpeg",
            MediaKind::Mp4 => "video/mp4",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Strip a title down to ASCII word characters and whitespace.
///
/// Every whitespace character becomes a plain space so the result is always
/// a valid header value.
pub fn sanitize_title(title: &str) -> String {
    title
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || c.is_whitespace())
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Filename offered to the client, e.g. `My Video.mp4`.
///
/// Falls back to `fallback_stem` when nothing survives sanitizing.
pub fn download_filename(title: &str, kind: MediaKind, fallback_stem: &str) -> String {
    let stem = sanitize_title(title);
    let stem = if stem.is_empty() {
        sanitize_title(fallback_stem)
    } else {
        stem
    };
    format!("{}.{}", stem, kind.extension())
}

/// `Content-Disposition` value for `filename`
pub fn content_disposition(filename: &str) -> String {
    format!("attachment; filename=\"{}\"", filename)
}
