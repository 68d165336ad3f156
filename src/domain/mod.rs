//! # Domain Layer
//!
//! Types that describe a postal lookup independently of any source.

pub mod entities;
pub mod value_objects;

pub use entities::CommonRecord;
pub use value_objects::{PostalQuery, QueryError};
