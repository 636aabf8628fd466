//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - REST API routes for the cost reconciliation engine
//! - Application state shared across handlers
//! - Service-error to HTTP-response mapping

pub mod routes;

use axum::Router;
use sitecost_store::EnvelopeService;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Envelope orchestration service.
    pub service: Arc<EnvelopeService>,
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
