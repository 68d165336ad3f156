//! # Postal Query Value Object
//!
//! The postal code (CEP) a caller asks about.
//!
//! The query is opaque: it is only guaranteed to be non-empty. Format checks
//! are left to the lookup sources themselves.
//!
//! # Examples
//!
//! ```
//! use cep_race::domain::value_objects::PostalQuery;
//!
//! let query = PostalQuery::new(" 01001000 ").unwrap();
//! assert_eq!(query.as_str(), "01001000");
//!
//! assert!(PostalQuery::new("   ").is_err());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error returned when a postal query cannot be constructed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// The postal code was empty or only whitespace.
    #[error("postal code must not be empty")]
    Empty,
}

/// An immutable, non-empty postal code as supplied by the caller.
///
/// # Invariants
///
/// - Never empty
/// - No leading or trailing whitespace
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PostalQuery(String);

impl PostalQuery {
    /// Creates a new postal query, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Empty`] if nothing is left after trimming.
    pub fn new(value: impl AsRef<str>) -> Result<Self, QueryError> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            return Err(QueryError::Empty);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the postal code as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PostalQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PostalQuery {
    type Error = QueryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PostalQuery> for String {
    fn from(query: PostalQuery) -> Self {
        query.0
    }
}

impl AsRef<str> for PostalQuery {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn new_trims_whitespace() {
        let query = PostalQuery::new("\t01001000\n").unwrap();
        assert_eq!(query.as_str(), "01001000");
    }

    #[test]
    fn new_rejects_empty() {
        assert_eq!(PostalQuery::new(""), Err(QueryError::Empty));
        assert_eq!(PostalQuery::new("  "), Err(QueryError::Empty));
    }

    #[test]
    fn new_does_not_validate_format() {
        assert!(PostalQuery::new("not-a-cep").is_ok());
        assert!(PostalQuery::new("01001-000").is_ok());
    }

    #[test]
    fn display_matches_inner() {
        let query = PostalQuery::new("89010025").unwrap();
        assert_eq!(query.to_string(), "89010025");
    }

    #[test]
    fn serde_roundtrip_rejects_empty() {
        let ok: PostalQuery = serde_json::from_str("\"01001000\"").unwrap();
        assert_eq!(ok.as_str(), "01001000");

        let err = serde_json::from_str::<PostalQuery>("\"\"");
        assert!(err.is_err());
    }
}
