//! # Source Registry
//!
//! The fixed set of lookup sources a race fans out to.
//!
//! Each [`SourceDescriptor`] names a service, the URL template used to reach
//! it, and the [`FieldMapping`] that reconciles its JSON field names with
//! the common record. The registry is built once at startup and never
//! mutated afterwards.
//!
//! # Examples
//!
//! ```
//! use cep_race::infrastructure::sources::registry::SourceRegistry;
//!
//! let registry = SourceRegistry::builtin();
//! let names: Vec<&str> = registry.sources().iter().map(|s| s.name()).collect();
//! assert_eq!(names, ["Brasil API", "Via CEP API", "Open CEP API"]);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

/// Placeholder replaced by the postal code in URL templates.
pub const CEP_PLACEHOLDER: &str = "{cep}";

/// Error raised while assembling a registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Two sources share the same name.
    #[error("duplicate source name: {0}")]
    DuplicateName(String),

    /// A template has no `{cep}` placeholder.
    #[error("source {name} has no {{cep}} placeholder in template {template}")]
    MissingPlaceholder {
        /// Source name.
        name: String,
        /// Offending template.
        template: String,
    },

    /// A source has an empty name.
    #[error("source name must not be empty")]
    EmptyName,
}

/// JSON keys a source uses for each common field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    /// Key holding the postal code.
    pub postal_code: String,
    /// Key holding the state.
    pub state: String,
    /// Key holding the city.
    pub city: String,
    /// Key holding the neighborhood.
    pub neighborhood: String,
    /// Key holding the street.
    pub street: String,
    /// Key the source sets to a truthy value when it has no answer.
    #[serde(default)]
    pub error_flag: Option<String>,
}

impl FieldMapping {
    /// Mapping for sources that use English field names (`cep/state/city/neighborhood/street`).
    #[must_use]
    pub fn english() -> Self {
        Self {
            postal_code: "cep".to_string(),
            state: "state".to_string(),
            city: "city".to_string(),
            neighborhood: "neighborhood".to_string(),
            street: "street".to_string(),
            error_flag: None,
        }
    }

    /// Mapping for sources that use the Correios field names
    /// (`cep/uf/localidade/bairro/logradouro`).
    #[must_use]
    pub fn correios() -> Self {
        Self {
            postal_code: "cep".to_string(),
            state: "uf".to_string(),
            city: "localidade".to_string(),
            neighborhood: "bairro".to_string(),
            street: "logradouro".to_string(),
            error_flag: None,
        }
    }

    /// Sets the key that signals "not found" inside a successful response.
    #[must_use]
    pub fn with_error_flag(mut self, key: impl Into<String>) -> Self {
        self.error_flag = Some(key.into());
        self
    }
}

impl Default for FieldMapping {
    fn default() -> Self {
        Self::english()
    }
}

/// One lookup source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    name: String,
    url_template: String,
    #[serde(default)]
    fields: FieldMapping,
}

impl SourceDescriptor {
    /// Creates a new source descriptor.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        url_template: impl Into<String>,
        fields: FieldMapping,
    ) -> Self {
        Self {
            name: name.into(),
            url_template: url_template.into(),
            fields,
        }
    }

    /// Returns the source name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the URL template.
    #[inline]
    #[must_use]
    pub fn url_template(&self) -> &str {
        &self.url_template
    }

    /// Returns the field mapping.
    #[inline]
    #[must_use]
    pub fn fields(&self) -> &FieldMapping {
        &self.fields
    }

    /// Renders the template for an already-vetted postal code.
    #[must_use]
    pub fn render(&self, cep: &str) -> String {
        self.url_template.replace(CEP_PLACEHOLDER, cep)
    }
}

/// Ordered, immutable set of sources.
#[derive(Debug, Clone, Default)]
pub struct SourceRegistry {
    sources: Vec<Arc<SourceDescriptor>>,
}

impl SourceRegistry {
    /// Builds a registry, checking names and templates.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] if a name is empty or repeated, or a
    /// template lacks the `{cep}` placeholder.
    pub fn new(sources: Vec<SourceDescriptor>) -> Result<Self, RegistryError> {
        let mut seen = HashSet::with_capacity(sources.len());
        for source in &sources {
            if source.name.trim().is_empty() {
                return Err(RegistryError::EmptyName);
            }
            if !seen.insert(source.name.as_str()) {
                return Err(RegistryError::DuplicateName(source.name.clone()));
            }
            if !source.url_template.contains(CEP_PLACEHOLDER) {
                return Err(RegistryError::MissingPlaceholder {
                    name: source.name.clone(),
                    template: source.url_template.clone(),
                });
            }
        }

        Ok(Self {
            sources: sources.into_iter().map(Arc::new).collect(),
        })
    }

    /// The public CEP services queried by default.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            sources: builtin_sources().into_iter().map(Arc::new).collect(),
        }
    }

    /// Returns the sources in registration order.
    #[inline]
    #[must_use]
    pub fn sources(&self) -> &[Arc<SourceDescriptor>] {
        &self.sources
    }

    /// Looks up a source by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<SourceDescriptor>> {
        self.sources.iter().find(|s| s.name == name)
    }

    /// Returns the number of sources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Returns true if there are no sources.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

/// Descriptors for the built-in services.
#[must_use]
pub fn builtin_sources() -> Vec<SourceDescriptor> {
    vec![
        SourceDescriptor::new(
            "Brasil API",
            "https://brasilapi.com.br/api/cep/v1/{cep}",
            FieldMapping::english(),
        ),
        SourceDescriptor::new(
            "Via CEP API",
            "http://viacep.com.br/ws/{cep}/json",
            FieldMapping::correios().with_error_flag("erro"),
        ),
        SourceDescriptor::new(
            "Open CEP API",
            "http://opencep.com/v1/{cep}",
            FieldMapping::correios(),
        ),
    ]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn builtin_passes_validation() {
        let registry = SourceRegistry::new(builtin_sources()).unwrap();
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn sources_are_stable_across_calls() {
        let registry = SourceRegistry::builtin();
        let first: Vec<String> = registry.sources().iter().map(|s| s.name().to_string()).collect();
        let second: Vec<String> = registry.sources().iter().map(|s| s.name().to_string()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn rejects_duplicate_names() {
        let result = SourceRegistry::new(vec![
            SourceDescriptor::new("A", "http://a/{cep}", FieldMapping::english()),
            SourceDescriptor::new("A", "http://b/{cep}", FieldMapping::english()),
        ]);
        assert_eq!(result.unwrap_err(), RegistryError::DuplicateName("A".to_string()));
    }

    #[test]
    fn rejects_missing_placeholder() {
        let result = SourceRegistry::new(vec![SourceDescriptor::new(
            "A",
            "http://a/fixed",
            FieldMapping::english(),
        )]);
        assert!(matches!(result, Err(RegistryError::MissingPlaceholder { .. })));
    }

    #[test]
    fn rejects_empty_name() {
        let result = SourceRegistry::new(vec![SourceDescriptor::new(
            " ",
            "http://a/{cep}",
            FieldMapping::english(),
        )]);
        assert_eq!(result.unwrap_err(), RegistryError::EmptyName);
    }

    #[test]
    fn render_replaces_every_placeholder() {
        let source = SourceDescriptor::new("A", "http://a/{cep}/x/{cep}", FieldMapping::english());
        assert_eq!(source.render("123"), "http://a/123/x/123");
    }

    #[test]
    fn get_by_name() {
        let registry = SourceRegistry::builtin();
        assert!(registry.get("Via CEP API").is_some());
        assert!(registry.get("Nope").is_none());
    }

    #[test]
    fn descriptor_deserializes_with_default_fields() {
        let source: SourceDescriptor =
            serde_json::from_str(r#"{"name":"X","url_template":"http://x/{cep}"}"#).unwrap();
        assert_eq!(source.fields(), &FieldMapping::english());
    }
}
