//! # Infrastructure Layer
//!
//! Adapters to the outside world: the lookup services themselves.

pub mod sources;
