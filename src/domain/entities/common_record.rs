//! # Common Record
//!
//! Source-agnostic address record produced from the winning lookup.
//!
//! Every lookup service names its fields differently; the normalizer maps
//! them onto [`CommonRecord`], which is what callers get back. Only the
//! source tag is guaranteed: services do not share identical field sets,
//! so every address field is optional.

use serde::{Deserialize, Serialize};

/// Normalized address for one postal code, tagged with its provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommonRecord {
    /// Postal code as echoed by the source.
    #[serde(rename = "cep")]
    pub postal_code: Option<String>,
    /// State (UF).
    pub state: Option<String>,
    /// City (localidade).
    pub city: Option<String>,
    /// Neighborhood (bairro).
    pub neighborhood: Option<String>,
    /// Street (logradouro).
    pub street: Option<String>,
    /// Name of the source that answered.
    pub source: String,
}

impl CommonRecord {
    /// Creates an empty record attributed to `source`.
    #[must_use]
    pub fn empty(source: impl Into<String>) -> Self {
        Self {
            postal_code: None,
            state: None,
            city: None,
            neighborhood: None,
            street: None,
            source: source.into(),
        }
    }
}
