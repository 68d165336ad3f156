//! # REST Handlers
//!
//! Request handlers for the lookup endpoints.

use crate::application::error::{LookupError, SourceCause};
use crate::application::services::race_executor::RaceExecutor;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::sync::Arc;

/// Header carrying the postal code on `GET /cep`.
pub const CEP_HEADER: &str = "cep";

/// Shared state for all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Executor used for every lookup.
    pub executor: Arc<RaceExecutor>,
}

impl AppState {
    /// Creates state around an executor.
    #[must_use]
    pub fn new(executor: RaceExecutor) -> Self {
        Self {
            executor: Arc::new(executor),
        }
    }
}

/// Body returned for failed lookups.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Failure mode label.
    pub error: String,
    /// Human-readable description.
    pub message: String,
    /// Per-source causes, when every source failed.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub causes: Vec<SourceCause>,
}

/// Body returned by the health check.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Always `"ok"`.
    pub status: String,
    /// Number of configured sources.
    pub sources: usize,
}

/// A request failure rendered as an HTTP response.
#[derive(Debug)]
pub enum ApiError {
    /// The `cep` header is present but not visible ASCII.
    InvalidHeader,
    /// The lookup itself failed.
    Lookup(LookupError),
}

impl From<LookupError> for ApiError {
    fn from(error: LookupError) -> Self {
        Self::Lookup(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Self::InvalidHeader => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: "invalid_cep_header".to_string(),
                    message: format!("{CEP_HEADER} header is not valid ASCII text"),
                    causes: Vec::new(),
                },
            ),
            Self::Lookup(LookupError::Query(error)) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: "missing_cep".to_string(),
                    message: error.to_string(),
                    causes: Vec::new(),
                },
            ),
            Self::Lookup(LookupError::Race(error)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse {
                    error: error.kind().to_string(),
                    message: error.to_string(),
                    causes: error.causes().to_vec(),
                },
            ),
        };
        (status, Json(body)).into_response()
    }
}

/// `GET /cep` with the postal code in the `cep` header.
pub async fn lookup_by_header(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let raw = match headers.get(CEP_HEADER) {
        Some(value) => value.to_str().map_err(|_| ApiError::InvalidHeader)?,
        None => "",
    };
    lookup(&state, raw).await
}

/// `GET /cep/{cep}`.
pub async fn lookup_by_path(
    State(state): State<Arc<AppState>>,
    Path(cep): Path<String>,
) -> Result<Response, ApiError> {
    lookup(&state, &cep).await
}

/// `GET /health`.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        sources: state.executor.registry().len(),
    })
}

async fn lookup(state: &AppState, raw: &str) -> Result<Response, ApiError> {
    let record = state.executor.lookup(raw).await?;
    Ok((StatusCode::OK, Json(record)).into_response())
}
