//! # Source Errors
//!
//! Error types for a single lookup source.
//!
//! A [`SourceError`] always belongs to exactly one source in one race. It is
//! recorded and logged, never raised across the task boundary: a race only
//! fails when every source produced one of these.
//!
//! # Examples
//!
//! ```
//! use cep_race::infrastructure::sources::error::SourceError;
//!
//! let error = SourceError::timeout_with_elapsed("shared deadline fired", 1000);
//! assert!(error.is_timeout());
//!
//! let error = SourceError::status(404, "not found");
//! assert!(!error.is_timeout());
//! assert_eq!(error.status_code(), Some(404));
//! ```

use thiserror::Error;

/// Error type for one lookup source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    /// The target URL could not be built from the template and query.
    #[error("malformed target: {message}")]
    MalformedTarget {
        /// Error message.
        message: String,
    },

    /// The shared deadline fired before the source answered.
    #[error("source timeout: {message}")]
    Timeout {
        /// Error message.
        message: String,
        /// Time spent waiting in milliseconds.
        elapsed_ms: Option<u64>,
    },

    /// Network or connection error.
    #[error("source connection error: {message}")]
    Connection {
        /// Error message.
        message: String,
    },

    /// The source answered with a non-success status.
    #[error("source returned status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly truncated.
        body: String,
    },

    /// The fetch task failed outside of I/O (e.g. it panicked).
    #[error("source internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },
}

/// Longest response body kept in a [`SourceError::Status`].
const MAX_BODY_CHARS: usize = 256;

impl SourceError {
    /// Creates a malformed target error.
    #[must_use]
    pub fn malformed_target(message: impl Into<String>) -> Self {
        Self::MalformedTarget {
            message: message.into(),
        }
    }

    /// Creates a timeout error.
    #[must_use]
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
            elapsed_ms: None,
        }
    }

    /// Creates a timeout error with the time spent waiting.
    #[must_use]
    pub fn timeout_with_elapsed(message: impl Into<String>, elapsed_ms: u64) -> Self {
        Self::Timeout {
            message: message.into(),
            elapsed_ms: Some(elapsed_ms),
        }
    }

    /// Creates a connection error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a status error, truncating long bodies.
    #[must_use]
    pub fn status(status: u16, body: impl AsRef<str>) -> Self {
        let body: String = body.as_ref().chars().take(MAX_BODY_CHARS).collect();
        Self::Status { status, body }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if the source ran out of time.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns the HTTP status, if the source answered with one.
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type for source operations.
pub type SourceResult<T> = Result<T, SourceError>;
