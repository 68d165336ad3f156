//! # REST Routes
//!
//! Router assembly for the lookup API.

use crate::api::rest::handlers::{self, AppState};
use axum::Router;
use axum::routing::get;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Builds the router with all endpoints and request tracing.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/cep", get(handlers::lookup_by_header))
        .route("/cep/{cep}", get(handlers::lookup_by_path))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
