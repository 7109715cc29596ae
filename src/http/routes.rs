//! Axum router configuration

use axum::{
    http::{header, Method},
    routing::get,
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

use super::download::download;
use super::handlers::{download_stats, health_check, version_check};

/// Create the Axum router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    let mut router = Router::new()
        .route("/download", get(download))
        // Health and version endpoints
        .route("/health", get(health_check))
        .route("/version", get(version_check))
        // Debug endpoints
        .route("/debug/downloads", get(download_stats))
        // Everything else comes from the static directory
        .fallback_service(ServeDir::new(&state.config.static_dir))
        .layer(TraceLayer::new_for_http());

    if state.config.cors_enabled {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::HEAD, Method::OPTIONS])
            .allow_headers([header::ACCEPT, header::CONTENT_TYPE, header::ORIGIN])
            .expose_headers([header::CONTENT_DISPOSITION])
            .max_age(Duration::from_secs(3600));
        router = router.layer(cors);
    }

    router.with_state(state)
}
