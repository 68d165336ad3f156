//! # Application Errors
//!
//! Error types surfaced to callers of a race.
//!
//! Per-source problems ([`SourceError`]) never reach the caller on their own;
//! they are collected into a [`RaceError::AggregateFailure`] when no source
//! succeeds.
//!
//! # Error Hierarchy
//!
//! ```text
//! LookupError
//! ├── Query(QueryError)              - Unusable postal code input
//! └── Race(RaceError)
//!     ├── NoSources                  - Empty registry
//!     ├── AggregateFailure           - Every source failed or timed out
//!     └── Decode                     - Winner's payload was unusable
//! ```
//!
//! # Examples
//!
//! ```
//! use cep_race::application::error::{RaceError, SourceCause};
//! use cep_race::infrastructure::sources::error::SourceError;
//!
//! let err = RaceError::AggregateFailure {
//!     deadline_expired: true,
//!     causes: vec![SourceCause::new("Slow", SourceError::timeout("late"))],
//! };
//! assert_eq!(err.kind(), "deadline_expired");
//! assert!(err.deadline_expired());
//! ```

use crate::application::services::normalizer::DecodeError;
use crate::domain::value_objects::QueryError;
use crate::infrastructure::sources::error::SourceError;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Why one source did not produce the answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceCause {
    /// Source name.
    pub source: String,
    /// What went wrong.
    #[serde(serialize_with = "serialize_display")]
    pub error: SourceError,
}

impl SourceCause {
    /// Creates a new cause.
    #[must_use]
    pub fn new(source: impl Into<String>, error: SourceError) -> Self {
        Self {
            source: source.into(),
            error,
        }
    }
}

impl fmt::Display for SourceCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.source, self.error)
    }
}

fn serialize_display<S: serde::Serializer>(
    value: &impl fmt::Display,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

/// Error type for a whole race.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RaceError {
    /// There was nothing to race.
    #[error("no lookup sources configured")]
    NoSources,

    /// No source produced a success.
    #[error("{} ({})", aggregate_summary(.deadline_expired), join_causes(.causes))]
    AggregateFailure {
        /// True if the shared deadline fired before any success.
        deadline_expired: bool,
        /// One entry per configured source, in registry order.
        causes: Vec<SourceCause>,
    },

    /// The winning source's payload could not be normalized.
    #[error("winning source {source_name} returned an unusable payload: {error}")]
    Decode {
        /// Name of the winning source.
        source_name: String,
        /// Decoding failure.
        #[source]
        error: DecodeError,
    },
}

impl RaceError {
    /// Stable label for the failure mode.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NoSources => "no_sources",
            Self::AggregateFailure {
                deadline_expired: true,
                ..
            } => "deadline_expired",
            Self::AggregateFailure { .. } => "all_sources_failed",
            Self::Decode { .. } => "decode_failed",
        }
    }

    /// Returns true if the race ended because the deadline fired.
    #[must_use]
    pub fn deadline_expired(&self) -> bool {
        matches!(
            self,
            Self::AggregateFailure {
                deadline_expired: true,
                ..
            }
        )
    }

    /// Per-source causes, empty unless this is an aggregate failure.
    #[must_use]
    pub fn causes(&self) -> &[SourceCause] {
        match self {
            Self::AggregateFailure { causes, .. } => causes,
            _ => &[],
        }
    }
}

fn aggregate_summary(deadline_expired: &bool) -> &'static str {
    if *deadline_expired {
        "deadline expired before any source answered"
    } else {
        "all sources failed"
    }
}

fn join_causes(causes: &[SourceCause]) -> String {
    causes
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type for race operations.
pub type RaceResult<T> = Result<T, RaceError>;

/// Error returned by a lookup starting from raw caller input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// The postal code input was unusable.
    #[error("invalid query: {0}")]
    Query(#[from] QueryError),

    /// The race failed.
    #[error(transparent)]
    Race(#[from] RaceError),
}

impl LookupError {
    /// Returns true if the caller supplied bad input.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Query(_))
    }
}
