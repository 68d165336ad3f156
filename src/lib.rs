//! # cep-race
//!
//! Postal code (CEP) lookup that queries several independent services at
//! once and returns whichever valid answer arrives first.
//!
//! ## Layers
//!
//! - [`domain`]: [`PostalQuery`](domain::PostalQuery) and the normalized
//!   [`CommonRecord`](domain::CommonRecord)
//! - [`infrastructure`]: source registry, request builder, shared deadline,
//!   and the reqwest fetcher
//! - [`application`]: the [`RaceExecutor`](application::services::RaceExecutor),
//!   its single-admission rendezvous, and the response normalizer
//! - [`api`]: axum endpoints
//! - [`config`]: layered settings
//!
//! ## Example
//!
//! ```ignore
//! use cep_race::application::services::{RaceConfig, RaceExecutor};
//! use cep_race::infrastructure::sources::{HttpFetcher, SourceRegistry};
//! use std::sync::Arc;
//!
//! let executor = RaceExecutor::new(
//!     Arc::new(SourceRegistry::builtin()),
//!     Arc::new(HttpFetcher::new(1000)?),
//!     RaceConfig::default(),
//! );
//! let record = executor.lookup("01001000").await?;
//! assert!(["Brasil API", "Via CEP API", "Open CEP API"].contains(&record.source.as_str()));
//! ```

pub mod api;
pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
