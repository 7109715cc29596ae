//! Video URL validation
//!
//! Accepts watch URLs on the platform's query domains (`?v=<id>`) and the
//! short/embed forms on its path domains (`youtu.be/<id>`,
//! `youtube.com/embed/<id>` and friends). Purely syntactic; nothing here
//! touches the network.

use regex::Regex;
use std::fmt;
use std::sync::OnceLock;
use url::Url;

use crate::error::SourceError;

/// Hosts whose watch URLs carry the ID in the `v` query parameter
const QUERY_DOMAINS: &[&str] = &[
    "youtube.com",
    "www.youtube.com",
    "m.youtube.com",
    "music.youtube.com",
    "gaming.youtube.com",
];

/// Length of a platform video ID
pub const VIDEO_ID_LEN: usize = 11;

fn path_domain_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^https?://(youtu\.be/|(www\.)?youtube\.com/(embed|v|shorts|live)/)")
            .expect("static regex")
    })
}

fn id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-zA-Z0-9_-]{11}$").expect("static regex"))
}

/// An 11-character video ID extracted from a valid URL
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VideoId(String);

impl VideoId {
    /// Validate a bare ID
    pub fn parse(id: &str) -> Result<Self, SourceError> {
        if id_re().is_match(id) {
            Ok(Self(id.to_string()))
        } else {
            Err(SourceError::InvalidUrl(format!(
                "video id \"{}\" does not match expected format",
                id
            )))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Canonical watch page URL for this ID
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.0)
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Extract the video ID from `input`, rejecting anything that is not a
/// platform video URL.
pub fn parse_video_url(input: &str) -> Result<VideoId, SourceError> {
    let input = input.trim();
    let parsed = Url::parse(input).map_err(|e| SourceError::InvalidUrl(e.to_string()))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(SourceError::InvalidUrl(format!(
            "unsupported scheme: {}",
            parsed.scheme()
        )));
    }

    let mut id = parsed
        .query_pairs()
        .find(|(k, _)| k == "v")
        .map(|(_, v)| v.into_owned());

    if path_domain_re().is_match(input) && id.is_none() {
        id = parsed
            .path_segments()
            .and_then(|mut segs| {
                let first = segs.next()?;
                // youtu.be/<id> vs youtube.com/<kind>/<id>
                if parsed.host_str() == Some("youtu.be") {
                    Some(first)
                } else {
                    segs.next()
                }
            })
            .map(str::to_string);
    } else {
        let host = parsed.host_str().unwrap_or_default();
        if !QUERY_DOMAINS.contains(&host) {
            return Err(SourceError::InvalidUrl(format!(
                "not a YouTube domain: {}",
                host
            )));
        }
    }

    let id = match id {
        Some(id) if !id.is_empty() => id,
        _ => {
            return Err(SourceError::InvalidUrl(format!(
                "no video id found: {}",
                input
            )))
        }
    };

    let truncated: String = id.chars().take(VIDEO_ID_LEN).collect();
    VideoId::parse(&truncated)
}
