//! # Response Normalizer
//!
//! Decodes a winning payload into a [`CommonRecord`].
//!
//! Decoding is driven entirely by the source's [`FieldMapping`]; there is no
//! per-service code. Missing fields are tolerated because the services do
//! not share identical field sets.
//!
//! # Examples
//!
//! ```
//! use cep_race::application::services::normalizer::normalize;
//! use cep_race::infrastructure::sources::registry::{FieldMapping, SourceDescriptor};
//!
//! let source = SourceDescriptor::new("Via CEP API", "http://viacep.test/{cep}", FieldMapping::correios());
//! let payload = br#"{"cep":"01001-000","uf":"SP","localidade":"Sao Paulo"}"#;
//!
//! let record = normalize(payload, &source).unwrap();
//! assert_eq!(record.state.as_deref(), Some("SP"));
//! assert_eq!(record.city.as_deref(), Some("Sao Paulo"));
//! assert_eq!(record.source, "Via CEP API");
//! ```

use crate::domain::entities::CommonRecord;
use crate::infrastructure::sources::registry::{FieldMapping, SourceDescriptor};
use serde_json::{Map, Value};
use thiserror::Error;

/// Error raised when a payload does not fit the source's schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The payload is not valid JSON.
    #[error("payload is not valid JSON: {0}")]
    Malformed(String),

    /// The payload is valid JSON but not an object.
    #[error("payload is not a JSON object (found {0})")]
    NotAnObject(&'static str),

    /// A mapped field holds something other than a string or number.
    #[error("field {field} has unexpected type {found}")]
    FieldType {
        /// JSON key in the payload.
        field: String,
        /// JSON type that was found.
        found: &'static str,
    },

    /// The source answered successfully but flagged the lookup as failed.
    #[error("source reported no result via field {flag}")]
    SourceReported {
        /// JSON key carrying the flag.
        flag: String,
    },
}

/// Decodes `payload` using the mapping of `source`.
///
/// Pure: the same payload and source always yield the same result.
///
/// # Errors
///
/// Returns [`DecodeError`] if the payload is not a JSON object, a mapped
/// field has an unusable type, or the source's error flag is set.
pub fn normalize(payload: &[u8], source: &SourceDescriptor) -> Result<CommonRecord, DecodeError> {
    let value: Value =
        serde_json::from_slice(payload).map_err(|e| DecodeError::Malformed(e.to_string()))?;

    let object = match value {
        Value::Object(object) => object,
        other => return Err(DecodeError::NotAnObject(json_type(&other))),
    };

    let fields: &FieldMapping = source.fields();

    if let Some(flag) = &fields.error_flag {
        if object.get(flag).is_some_and(is_truthy) {
            return Err(DecodeError::SourceReported { flag: flag.clone() });
        }
    }

    let mut record = CommonRecord::empty(source.name());
    record.postal_code = text_field(&object, &fields.postal_code)?;
    record.state = text_field(&object, &fields.state)?;
    record.city = text_field(&object, &fields.city)?;
    record.neighborhood = text_field(&object, &fields.neighborhood)?;
    record.street = text_field(&object, &fields.street)?;
    Ok(record)
}

fn text_field(object: &Map<String, Value>, key: &str) -> Result<Option<String>, DecodeError> {
    match object.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(DecodeError::FieldType {
            field: key.to_string(),
            found: json_type(other),
        }),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty() && !s.eq_ignore_ascii_case("false"),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::Null => false,
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
