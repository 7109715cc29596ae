//! HTTP server module
//!
//! This module handles HTTP request routing and handling:
//! - Axum router with the download endpoint and static files
//! - Request handlers and error responses
//! - CORS and request tracing middleware

pub mod download;
pub mod handlers;
pub mod routes;

pub use routes::create_router;
