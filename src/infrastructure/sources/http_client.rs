//! # HTTP Source Fetcher
//!
//! reqwest-backed [`SourceFetcher`] used against the real lookup services.
//!
//! The fetcher issues a single GET, classifies the status, and buffers the
//! body. It never parses JSON; that is the normalizer's job once a winner
//! has been admitted.
//!
//! # Examples
//!
//! ```ignore
//! use cep_race::infrastructure::sources::http_client::HttpFetcher;
//!
//! let fetcher = HttpFetcher::new(1000)?;
//! let outcome = fetcher.fetch(&request).await;
//! ```

use crate::infrastructure::sources::error::{SourceError, SourceResult};
use crate::infrastructure::sources::request::OutboundRequest;
use crate::infrastructure::sources::traits::{FetchOutcome, SourceFetcher};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, header};
use std::time::Duration;
use tokio::time::Instant;

/// HTTP fetcher for lookup sources.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    /// Inner reqwest client.
    client: Client,
    /// Backstop request timeout in milliseconds.
    timeout_ms: u64,
}

impl HttpFetcher {
    /// Creates a new fetcher with the given backstop timeout.
    ///
    /// The race's shared deadline is what normally stops a fetch; this
    /// timeout only bounds requests issued outside a race.
    ///
    /// # Errors
    ///
    /// Returns `SourceError::Internal` if the client cannot be created.
    pub fn new(timeout_ms: u64) -> SourceResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SourceError::internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, timeout_ms })
    }

    /// Returns the configured timeout in milliseconds.
    #[inline]
    #[must_use]
    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    /// Maps a reqwest error to an outcome.
    fn map_reqwest_error(error: &reqwest::Error, elapsed: Duration) -> FetchOutcome {
        if error.is_timeout() {
            FetchOutcome::TimedOut { elapsed }
        } else if error.is_connect() {
            FetchOutcome::Failure(SourceError::connection(format!(
                "Connection failed: {}",
                error
            )))
        } else {
            FetchOutcome::Failure(SourceError::connection(format!(
                "HTTP request failed: {}",
                error
            )))
        }
    }
}

#[async_trait]
impl SourceFetcher for HttpFetcher {
    async fn fetch(&self, request: &OutboundRequest) -> FetchOutcome {
        let start = Instant::now();

        let response = match self
            .client
            .get(request.url().clone())
            .header(header::ACCEPT, "application/json")
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return Self::map_reqwest_error(&e, start.elapsed()),
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return FetchOutcome::Failure(map_status_error(status, &body));
        }

        match response.bytes().await {
            Ok(payload) => FetchOutcome::Success {
                payload,
                elapsed: start.elapsed(),
            },
            Err(e) => Self::map_reqwest_error(&e, start.elapsed()),
        }
    }
}

/// Maps a non-success HTTP status to a source error.
fn map_status_error(status: StatusCode, body: &str) -> SourceError {
    SourceError::status(status.as_u16(), body)
}
