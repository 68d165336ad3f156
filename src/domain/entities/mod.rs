//! # Domain Entities
//!
//! - [`CommonRecord`]: Normalized address returned to callers

pub mod common_record;

pub use common_record::CommonRecord;
