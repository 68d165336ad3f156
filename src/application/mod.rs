//! # Application Layer
//!
//! Use cases built on top of the domain and infrastructure layers.

pub mod error;
pub mod services;

pub use error::{LookupError, RaceError, RaceResult, SourceCause};
