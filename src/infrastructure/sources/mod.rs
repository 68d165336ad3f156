//! # Lookup Sources
//!
//! Everything needed to reach one postal lookup service.
//!
//! - [`SourceRegistry`] / [`SourceDescriptor`]: the configured services
//! - [`OutboundRequest`]: one request, bound to a race's [`Deadline`]
//! - [`SourceFetcher`]: port for issuing the request, with [`HttpFetcher`]
//!   as the reqwest implementation
//! - [`SourceError`]: per-source failures

pub mod deadline;
pub mod error;
pub mod http_client;
pub mod registry;
pub mod request;
pub mod traits;

pub use deadline::Deadline;
pub use error::{SourceError, SourceResult};
pub use http_client::HttpFetcher;
pub use registry::{FieldMapping, RegistryError, SourceDescriptor, SourceRegistry};
pub use request::OutboundRequest;
pub use traits::{FetchOutcome, SourceFetcher};
