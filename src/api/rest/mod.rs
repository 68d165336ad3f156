//! # REST API
//!
//! axum endpoints exposing the postal lookup.
//!
//! # Endpoints
//!
//! - `GET /cep` - Look up the postal code in the `cep` header
//! - `GET /cep/{cep}` - Look up the postal code in the path
//! - `GET /health` - Health check endpoint
//!
//! A resolved race answers `200` with the normalized record and a `source`
//! tag. A missing postal code answers `400`; a failed race answers `500`
//! with the failure mode and the per-source causes.
//!
//! # Usage
//!
//! ```ignore
//! use cep_race::api::rest::{create_router, AppState};
//! use std::sync::Arc;
//!
//! let state = Arc::new(AppState::new(executor));
//! let router = create_router(state);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, router).await?;
//! ```

pub mod handlers;
pub mod routes;

pub use handlers::{ApiError, AppState, CEP_HEADER, ErrorResponse, HealthResponse};
pub use routes::create_router;
