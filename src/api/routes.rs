//! API route definitions

use axum::routing::get;
use axum::routing::post;
use axum::Router;

use super::handlers::AppState;
use super::handlers::{
    self,
};

/// Create RESTful API router
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health))
        // Enrichment progress
        .route("/enrichment-progress", get(handlers::enrichment_progress))
        // Connections upload
        .route("/upload-csv", post(handlers::upload_csv))
        // Mission-driven retrieval
        .route("/get-suggestions", post(handlers::get_suggestions))
        // Outreach message generation
        .route("/generate-message", post(handlers::generate_message))
        .with_state(state)
}
