//! Web API module for Chartographer
//!
//! Provides REST API endpoints for:
//! - Canvas creation and deletion
//! - Reading and writing canvas segments
//! - Health checks

pub mod chartas;
pub mod error;
pub mod health;

use axum::{extract::DefaultBodyLimit, Extension, Router};
use chartographer_core::CanvasService;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub use chartas::chartas_routes;
pub use health::health_routes;

/// Create the API router with all endpoints
pub fn api_router(service: Arc<CanvasService>, max_body_bytes: usize) -> Router {
    Router::new()
        .merge(health_routes())
        .merge(chartas_routes())
        .layer(Extension(service))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
}
