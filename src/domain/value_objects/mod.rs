//! # Value Objects
//!
//! Immutable types with validation and domain semantics.
//!
//! - [`PostalQuery`]: Non-empty postal code supplied by the caller

pub mod postal_query;

pub use postal_query::{PostalQuery, QueryError};
