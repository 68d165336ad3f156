//! # Source Fetcher Trait
//!
//! Port definition for issuing one lookup against one source.
//!
//! The race executor only talks to sources through [`SourceFetcher`], so
//! tests can swap the HTTP implementation for scripted fakes.
//!
//! # Examples
//!
//! ```ignore
//! use cep_race::infrastructure::sources::traits::{FetchOutcome, SourceFetcher};
//! use cep_race::infrastructure::sources::request::OutboundRequest;
//!
//! #[derive(Debug)]
//! struct AlwaysDown;
//!
//! #[async_trait::async_trait]
//! impl SourceFetcher for AlwaysDown {
//!     async fn fetch(&self, _request: &OutboundRequest) -> FetchOutcome {
//!         FetchOutcome::Failure(SourceError::connection("down"))
//!     }
//! }
//! ```

use crate::infrastructure::sources::error::SourceError;
use crate::infrastructure::sources::request::OutboundRequest;
use async_trait::async_trait;
use bytes::Bytes;
use std::fmt;
use std::time::Duration;

/// What one fetch produced. Exactly one per source per race.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The source answered with a success status.
    Success {
        /// Raw response body.
        payload: Bytes,
        /// Time from request start to full body.
        elapsed: Duration,
    },
    /// Transport error or non-success status.
    Failure(SourceError),
    /// The shared deadline fired first.
    TimedOut {
        /// Time spent before giving up.
        elapsed: Duration,
    },
}

impl FetchOutcome {
    /// Creates a success outcome.
    #[must_use]
    pub fn success(payload: impl Into<Bytes>, elapsed: Duration) -> Self {
        Self::Success {
            payload: payload.into(),
            elapsed,
        }
    }

    /// Returns true for [`FetchOutcome::Success`].
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Converts an unsuccessful outcome into its cause.
    ///
    /// Returns `None` for a success.
    #[must_use]
    pub fn into_error(self) -> Option<SourceError> {
        match self {
            Self::Success { .. } => None,
            Self::Failure(error) => Some(error),
            Self::TimedOut { elapsed } => Some(SourceError::timeout_with_elapsed(
                "shared deadline fired before the source answered",
                duration_ms(elapsed),
            )),
        }
    }
}

/// Issues a single request to a source.
///
/// Implementations must not retry and must not panic on I/O errors; every
/// problem is reported as a [`FetchOutcome`].
#[async_trait]
pub trait SourceFetcher: Send + Sync + fmt::Debug {
    /// Performs the fetch described by `request`.
    async fn fetch(&self, request: &OutboundRequest) -> FetchOutcome;
}

/// Whole milliseconds in `duration`, saturating.
#[must_use]
pub fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn into_error_maps_timeout() {
        let outcome = FetchOutcome::TimedOut {
            elapsed: Duration::from_millis(1000),
        };
        let error = outcome.into_error();
        assert!(matches!(
            error,
            Some(SourceError::Timeout {
                elapsed_ms: Some(1000),
                ..
            })
        ));
    }

    #[test]
    fn success_has_no_error() {
        let outcome = FetchOutcome::success("{}", Duration::from_millis(5));
        assert!(outcome.is_success());
        assert!(outcome.into_error().is_none());
    }
}
