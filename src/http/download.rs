//! Download endpoint
//!
//! GET /download?url=<url>&type=<mp3|mp4>&quality=<quality>
//!
//! The response status is only decided once the first body chunk is in
//! hand (see [`crate::stream::prime`]). Anything that fails before then
//! becomes a plain-text error response; anything that fails later is logged
//! and ends the body early.

use axum::{
    body::Body,
    extract::{RawQuery, State},
    http::{header, StatusCode},
    response::Response,
};
use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use std::fmt::Display;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tracing::Instrument;
use uuid::Uuid;

use super::handlers::HttpError;
use crate::media::{content_disposition, download_filename, MediaKind};
use crate::source::{Quality, StreamRequest, VideoId};
use crate::state::{AppState, DownloadGuard};
use crate::stream::{prime, ByteStream};

/// Query parameters for the download endpoint
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DownloadQuery {
    pub url: Option<String>,
    /// The `type` parameter
    pub kind: Option<String>,
    pub quality: Option<String>,
}

impl DownloadQuery {
    /// Parse a raw query string. Never fails.
    ///
    /// A repeated `url` or `type` has no single value and counts as absent,
    /// so the request is rejected or falls back to MP4. A repeated `quality`
    /// is a list of preferences and the first one is used.
    pub fn parse(raw: Option<&str>) -> Self {
        let mut urls = Vec::new();
        let mut kinds = Vec::new();
        let mut qualities = Vec::new();

        for (key, value) in url::form_urlencoded::parse(raw.unwrap_or_default().as_bytes()) {
            match key.as_ref() {
                "url" => urls.push(value.into_owned()),
                "type" => kinds.push(value.into_owned()),
                "quality" => qualities.push(value.into_owned()),
                _ => {}
            }
        }

        Self {
            url: single(urls),
            kind: single(kinds),
            quality: qualities.into_iter().next(),
        }
    }
}

fn single(mut values: Vec<String>) -> Option<String> {
    if values.len() == 1 {
        values.pop()
    } else {
        None
    }
}

/// GET /download
pub async fn download(
    State(state): State<Arc<AppState>>,
    RawQuery(raw): RawQuery,
) -> Result<Response, HttpError> {
    let query = DownloadQuery::parse(raw.as_deref());
    let url = query.url.unwrap_or_default();
    let video_id = match state.source.validate_url(&url) {
        Ok(id) => id,
        Err(e) => {
            tracing::debug!("Rejected download request: {}", e);
            return Err(HttpError::InvalidUrl);
        }
    };

    let kind = MediaKind::from_param(query.kind.as_deref());
    let quality = Quality::from_param(query.quality.as_deref());
    let span = tracing::info_span!(
        "download",
        request_id = %Uuid::new_v4(),
        video = %video_id,
        kind = %kind,
    );

    serve_download(state, video_id, kind, quality, span.clone())
        .instrument(span)
        .await
}

fn download_failed(e: impl Display) -> HttpError {
    tracing::error!("Download error: {}", e);
    HttpError::DownloadFailed(e.to_string())
}

fn conversion_failed(e: impl Display) -> HttpError {
    tracing::error!("FFmpeg error: {}", e);
    HttpError::ConversionFailed(e.to_string())
}

async fn serve_download(
    state: Arc<AppState>,
    video_id: VideoId,
    kind: MediaKind,
    quality: Quality,
    span: tracing::Span,
) -> Result<Response, HttpError> {
    let guard = state.downloads.start();

    // Fetch by the ID that passed validation, not the raw URL
    let info = state
        .source
        .fetch_info(&video_id.watch_url())
        .await
        .map_err(download_failed)?;

    let filename = download_filename(&info.title, kind, video_id.as_str());
    tracing::info!(title = %info.title, %filename, "Starting download");

    let body = match kind {
        MediaKind::Mp3 => {
            let audio = state
                .source
                .open_stream(&info, &StreamRequest::audio_only())
                .await
                .map_err(download_failed)?;
            let mp3 = state.transcoder.to_mp3(audio).map_err(conversion_failed)?;
            let mp3 = prime(mp3).await.map_err(conversion_failed)?;
            ObservedBody::new(mp3, guard, span, "FFmpeg error", "Conversion finished")
        }
        MediaKind::Mp4 => {
            let video = state
                .source
                .open_stream(&info, &StreamRequest::combined(quality))
                .await
                .map_err(download_failed)?;
            let video = prime(video).await.map_err(download_failed)?;
            ObservedBody::new(video, guard, span, "Download error", "Download finished")
        }
    };

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_DISPOSITION, content_disposition(&filename))
        .header(header::CONTENT_TYPE, kind.content_type())
        .body(Body::from_stream(body))
        .map_err(download_failed)
}

/// Response body that logs how the stream ended and settles the download
/// counters.
struct ObservedBody {
    inner: ByteStream,
    guard: Option<DownloadGuard>,
    span: tracing::Span,
    error_label: &'static str,
    finished_msg: &'static str,
    bytes_sent: u64,
}

impl ObservedBody {
    fn new(
        inner: ByteStream,
        guard: DownloadGuard,
        span: tracing::Span,
        error_label: &'static str,
        finished_msg: &'static str,
    ) -> Self {
        Self {
            inner,
            guard: Some(guard),
            span,
            error_label,
            finished_msg,
            bytes_sent: 0,
        }
    }
}

impl Stream for ObservedBody {
    type Item = io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;
        let _enter = this.span.enter();

        if this.guard.is_none() {
            return Poll::Ready(None);
        }

        match this.inner.poll_next_unpin(cx) {
            Poll::Ready(Some(Ok(chunk))) => {
                this.bytes_sent += chunk.len() as u64;
                Poll::Ready(Some(Ok(chunk)))
            }
            Poll::Ready(Some(Err(e))) => {
                tracing::error!(bytes_sent = this.bytes_sent, "{}: {}", this.error_label, e);
                this.guard.take();
                Poll::Ready(Some(Err(e)))
            }
            Poll::Ready(None) => {
                tracing::info!(bytes_sent = this.bytes_sent, "{}", this.finished_msg);
                if let Some(guard) = this.guard.take() {
                    guard.complete();
                }
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Drop for ObservedBody {
    fn drop(&mut self) {
        if self.guard.is_some() {
            let _enter = self.span.enter();
            tracing::warn!(
                bytes_sent = self.bytes_sent,
                "Client went away before the download finished"
            );
        }
    }
}
