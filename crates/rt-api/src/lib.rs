//! # rt-api
//!
//! The web routing and orchestration layer for Rusty-Turk.

pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;

use axum::routing::{get, post};
use axum::Router;

pub use handlers::AppState;

/// Builds the full HTTP surface.
///
/// # Developer Note
/// Paths mirror the endpoints the labeling front-end already calls, so they
/// are not versioned.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/image", get(handlers::random_image))
        .route("/api/image/{*file_name}", get(handlers::serve_image))
        .route("/api/submit", post(handlers::submit_annotations))
        .route("/api/annotations", get(handlers::list_annotations))
        .route("/api/validate", post(handlers::validate_annotation))
        .route("/debug/files", get(handlers::list_files))
        .route("/health", get(handlers::health))
        .layer(middleware::cors_policy())
        .layer(middleware::standard_middleware())
        .with_state(state)
}
