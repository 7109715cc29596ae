//! End-to-end tests through the axum router

use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;

use crate::http::create_router;
use crate::integration::fixtures::{
    test_state, test_state_with_transcoder, FakeSource, FakeTranscode, VIDEO_URL,
};
use crate::source::{Quality, StreamRequest};
use crate::transcode::Transcoder;

struct Harness {
    app: Router,
    source: Arc<FakeSource>,
    _static_dir: TempDir,
}

impl Harness {
    fn new(source: FakeSource, mode: FakeTranscode) -> Self {
        Self::build(source, |source, static_dir| test_state(source, mode, static_dir))
    }

    fn with_transcoder(source: FakeSource, transcoder: Arc<dyn Transcoder>) -> Self {
        Self::build(source, |source, static_dir| {
            test_state_with_transcoder(source, transcoder, static_dir)
        })
    }

    fn build(
        source: FakeSource,
        make_state: impl FnOnce(Arc<FakeSource>, &std::path::Path) -> Arc<crate::state::AppState>,
    ) -> Self {
        let static_dir = tempfile::tempdir().unwrap();
        std::fs::write(
            static_dir.path().join("index.html"),
            "<html><body>downloader</body></html>",
        )
        .unwrap();
        let source = Arc::new(source);
        let state = make_state(source.clone(), static_dir.path());
        Self {
            app: create_router(state),
            source,
            _static_dir: static_dir,
        }
    }

    fn ok() -> Self {
        Self::new(
            FakeSource::new("Hello, World! (Official Video)", b"0123456789"),
            FakeTranscode::Prefix,
        )
    }

    async fn get(&self, uri: &str) -> Response<Body> {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        self.app.clone().oneshot(request).await.unwrap()
    }
}

fn download_uri(query: &str) -> String {
    format!("/download?url={}{}", urlencode(VIDEO_URL), query)
}

fn urlencode(s: &str) -> String {
    url::form_urlencoded::byte_serialize(s.as_bytes()).collect()
}

fn header_str<'a>(response: &'a Response<Body>, name: header::HeaderName) -> Option<&'a str> {
    response.headers().get(name).and_then(|v| v.to_str().ok())
}

async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_invalid_url_rejected_before_fetch() {
    let h = Harness::ok();

    for uri in [
        "/download",
        "/download?url=",
        "/download?url=not-a-url&type=mp3",
        "/download?url=https%3A%2F%2Fvimeo.com%2F123456",
    ] {
        let response = h.get(uri).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        assert!(header_str(&response, header::CONTENT_DISPOSITION).is_none());
        assert_eq!(body_text(response).await, "Invalid YouTube URL");
    }

    assert_eq!(h.source.fetch_count(), 0);
}

#[tokio::test]
async fn test_repeated_query_keys_get_handler_responses() {
    let h = Harness::ok();

    let twice = format!(
        "/download?url={}&url={}",
        urlencode(VIDEO_URL),
        urlencode(VIDEO_URL)
    );
    let response = h.get(&twice).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(response).await, "Invalid YouTube URL");

    let response = h.get(&download_uri("&type=mp3&type=mp4")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header_str(&response, header::CONTENT_TYPE), Some("video/mp4"));
}

#[tokio::test]
async fn test_mp3_download() {
    let h = Harness::ok();
    let response = h.get(&download_uri("&type=mp3")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header_str(&response, header::CONTENT_TYPE), Some("audio/mpeg"));
    assert_eq!(
        header_str(&response, header::CONTENT_DISPOSITION),
        Some("attachment; filename=\"Hello World Official Video.mp3\"")
    );
    assert_eq!(body_text(response).await, "MP3:0123456789");
    assert_eq!(h.source.opened_requests(), vec![StreamRequest::audio_only()]);
}

#[tokio::test]
async fn test_mp4_is_default() {
    let h = Harness::ok();

    for query in ["", "&type=mp4", "&type=webm"] {
        let response = h.get(&download_uri(query)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(header_str(&response, header::CONTENT_TYPE), Some("video/mp4"));
        assert!(header_str(&response, header::CONTENT_DISPOSITION)
            .unwrap()
            .ends_with(".mp4\""));
        assert_eq!(body_text(response).await, "0123456789");
    }

    let opened = h.source.opened_requests();
    assert_eq!(opened.len(), 3);
    assert!(opened
        .iter()
        .all(|r| *r == StreamRequest::combined(Quality::Highest)));
}

#[tokio::test]
async fn test_mp4_quality_forwarded() {
    let h = Harness::ok();
    let response = h.get(&download_uri("&type=mp4&quality=18")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        h.source.opened_requests(),
        vec![StreamRequest::combined(Quality::Itag(18))]
    );
}

#[tokio::test]
async fn test_mp3_ignores_quality() {
    let h = Harness::ok();
    let response = h.get(&download_uri("&type=mp3&quality=lowest")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(h.source.opened_requests(), vec![StreamRequest::audio_only()]);
}

#[tokio::test]
async fn test_title_without_word_chars_falls_back_to_id() {
    let h = Harness::new(FakeSource::new("!!! ???", b"x"), FakeTranscode::Prefix);
    let response = h.get(&download_uri("")).await;
    assert_eq!(
        header_str(&response, header::CONTENT_DISPOSITION),
        Some("attachment; filename=\"dQw4w9WgXcQ.mp4\"")
    );
}

#[tokio::test]
async fn test_metadata_failure_is_500() {
    let h = Harness::new(
        FakeSource::failing_info("Video unavailable"),
        FakeTranscode::Prefix,
    );
    let response = h.get(&download_uri("&type=mp3")).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(header_str(&response, header::CONTENT_DISPOSITION).is_none());
    assert_eq!(
        body_text(response).await,
        "Download failed: Malformed metadata: Video unavailable"
    );
    assert_eq!(h.source.fetch_count(), 1);
    assert!(h.source.opened_requests().is_empty());
}

#[tokio::test]
async fn test_stream_failure_before_data_is_500() {
    let h = Harness::new(
        FakeSource::failing_stream("HTTP Error 403: Forbidden"),
        FakeTranscode::Prefix,
    );
    let response = h.get(&download_uri("")).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(header_str(&response, header::CONTENT_DISPOSITION).is_none());
    assert_eq!(
        body_text(response).await,
        "Download failed: HTTP Error 403: Forbidden"
    );
}

#[tokio::test]
async fn test_conversion_failure_before_data_is_500() {
    let h = Harness::new(
        FakeSource::new("Song", b"abc"),
        FakeTranscode::FailEarly("pipe:0: Invalid data found".to_string()),
    );
    let response = h.get(&download_uri("&type=mp3")).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(header_str(&response, header::CONTENT_TYPE)
        .unwrap()
        .starts_with("text/plain"));
    assert_eq!(
        body_text(response).await,
        "Conversion error: pipe:0: Invalid data found"
    );
}

#[tokio::test]
async fn test_transcoder_spawn_failure_is_500() {
    let h = Harness::new(
        FakeSource::new("Song", b"abc"),
        FakeTranscode::SpawnError("ffmpeg: not found".to_string()),
    );
    let response = h.get(&download_uri("&type=mp3")).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_text(response)
        .await
        .starts_with("Conversion error: Failed to spawn ffmpeg"));
}

#[tokio::test]
async fn test_conversion_failure_after_data_keeps_status() {
    let h = Harness::new(
        FakeSource::new("Song", b"abc"),
        FakeTranscode::FailLate("encoder crashed".to_string()),
    );
    let response = h.get(&download_uri("&type=mp3")).await;

    // Headers were committed with the first chunk; the failure only cuts the body
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header_str(&response, header::CONTENT_TYPE), Some("audio/mpeg"));
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await;
    assert!(body.is_err());
}

/// Transcoder running the passthrough ffmpeg stand-in from `dir`
#[cfg(unix)]
fn passthrough_transcoder(dir: &std::path::Path) -> Arc<dyn Transcoder> {
    use crate::config::TranscodeConfig;
    use crate::integration::fixtures::passthrough_ffmpeg;
    use crate::transcode::FfmpegTranscoder;

    Arc::new(FfmpegTranscoder::new(&TranscodeConfig {
        ffmpeg_path: passthrough_ffmpeg(dir),
        ..Default::default()
    }))
}

#[cfg(unix)]
#[tokio::test]
async fn test_mp3_source_failure_midway_is_not_completed() {
    let tools = tempfile::tempdir().unwrap();
    let h = Harness::with_transcoder(
        FakeSource::failing_midway(b"0123456789", "HTTP Error 403: Forbidden"),
        passthrough_transcoder(tools.path()),
    );
    let response = h.get(&download_uri("&type=mp3")).await;

    // Converted bytes were already flowing, so only the body is cut short
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await;
    assert!(body.is_err());

    let stats: serde_json::Value =
        serde_json::from_str(&body_text(h.get("/debug/downloads").await).await).unwrap();
    assert_eq!(stats["completed"], 0);
    assert_eq!(stats["failed"], 1);
}

#[cfg(unix)]
#[tokio::test]
async fn test_mp3_source_failure_before_data_reports_cause() {
    let tools = tempfile::tempdir().unwrap();
    let h = Harness::with_transcoder(
        FakeSource::failing_stream("HTTP Error 403: Forbidden"),
        passthrough_transcoder(tools.path()),
    );
    let response = h.get(&download_uri("&type=mp3")).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(header_str(&response, header::CONTENT_DISPOSITION).is_none());
    assert_eq!(
        body_text(response).await,
        "Conversion error: HTTP Error 403: Forbidden"
    );
}

#[tokio::test]
async fn test_metadata_fetched_by_validated_id() {
    let h = Harness::ok();

    for url in [
        "https://www.youtube.com/watch?v=dQw4w9WgXcQXYZ",
        "https://youtu.be/aaaaaaaaaaa?v=dQw4w9WgXcQ",
        "https://www.youtube.com/embed/dQw4w9WgXcQ?start=10",
    ] {
        let response = h.get(&format!("/download?url={}", urlencode(url))).await;
        assert_eq!(response.status(), StatusCode::OK, "{url}");
        body_text(response).await;
    }

    assert_eq!(h.source.fetched_urls(), vec![VIDEO_URL; 3]);
}

#[tokio::test]
async fn test_download_counters() {
    let h = Harness::ok();

    let ok = h.get(&download_uri("&type=mp3")).await;
    body_text(ok).await;

    let bad = h.get("/download?url=nope").await;
    assert_eq!(bad.status(), StatusCode::BAD_REQUEST);

    let stats: serde_json::Value =
        serde_json::from_str(&body_text(h.get("/debug/downloads").await).await).unwrap();
    assert_eq!(stats["started"], 1);
    assert_eq!(stats["completed"], 1);
    assert_eq!(stats["failed"], 0);
    assert_eq!(stats["active"], 0);
}

#[tokio::test]
async fn test_static_files() {
    let h = Harness::ok();

    let response = h.get("/").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("downloader"));

    let response = h.get("/index.html").await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = h.get("/missing.js").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health() {
    let h = Harness::ok();
    let response = h.get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "OK");
}
