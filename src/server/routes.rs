//! Router configuration for the web server.

use axum::extract::DefaultBodyLimit;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use super::handlers;
use super::AppState;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Batch generation job; response body streams tagged progress lines
        .route("/api/generate", post(handlers::generate))
        // Out-of-band cancellation: set / read / reset
        .route(
            "/api/cancel",
            post(handlers::cancel_set)
                .get(handlers::cancel_status)
                .put(handlers::cancel_reset),
        )
        // Example spreadsheet download
        .route("/api/sample", get(handlers::sample_workbook))
        .route("/api/health", get(handlers::health))
        .layer(DefaultBodyLimit::max(16 * 1024 * 1024))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
