//! # Application Services
//!
//! Services that orchestrate a lookup across sources.
//!
//! - [`RaceExecutor`]: Concurrent race over every source with a shared deadline
//! - [`Rendezvous`]: Single-admission hand-off for the winning answer
//! - [`normalize`]: Decoding of the winning payload into a common record

pub mod normalizer;
pub mod race_executor;
pub mod rendezvous;

pub use normalizer::{DecodeError, normalize};
pub use race_executor::{RaceConfig, RaceExecutor, race_sources};
pub use rendezvous::{Admission, Rendezvous};
