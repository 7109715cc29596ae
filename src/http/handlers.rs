//! HTTP request handlers
//!
//! Error mapping plus the small auxiliary endpoints. The download endpoint
//! lives in [`super::download`].

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::state::{AppState, DownloadStatsSnapshot};

/// HTTP error type
#[derive(Debug)]
pub enum HttpError {
    /// The `url` parameter is missing or not a video URL
    InvalidUrl,
    /// Metadata lookup or source download failed before any byte was sent
    DownloadFailed(String),
    /// The transcoder failed before any byte was sent
    ConversionFailed(String),
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            HttpError::InvalidUrl => (StatusCode::BAD_REQUEST, "Invalid YouTube URL".to_string()),
            HttpError::DownloadFailed(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Download failed: {}", msg),
            ),
            HttpError::ConversionFailed(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Conversion error: {}", msg),
            ),
        };

        (status, body).into_response()
    }
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "OK"
}

/// Version endpoint
pub async fn version_check() -> &'static str {
    concat!(env!("CARGO_PKG_NAME"), " v", env!("CARGO_PKG_VERSION"))
}

/// Debug endpoint - download counters
pub async fn download_stats(State(state): State<Arc<AppState>>) -> Json<DownloadStatsSnapshot> {
    Json(state.downloads.snapshot())
}
