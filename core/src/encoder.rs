//! Parameter encoding for MWS calls.
//!
//! MWS takes every parameter as a single query-string value. Scalars map to
//! their text form; collections are flattened with reserved separators:
//!
//! - sequence: `a,b,c`
//! - mapping: `k=v;k=v`
//!
//! Elements that would collide with a separator are rejected rather than
//! escaped, since MWS has no escaping rules. The output is not yet
//! percent-encoded; that happens when the query string is assembled.

use std::fmt;

use crate::error::EncodingError;
use crate::types::{ParameterValue, Redacted, Scalar};

/// A parameter value in its MWS text form.
///
/// Built only by `encode`, so it never contains a separator that is reserved
/// inside its own collection context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedParameter(String);

impl EncodedParameter {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for EncodedParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<&str> for EncodedParameter {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl PartialEq<str> for EncodedParameter {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

/// Encode a value for use as a parameter of an MWS call.
pub fn encode(value: &ParameterValue) -> Result<EncodedParameter, EncodingError> {
    let encoded = match value {
        ParameterValue::Scalar(scalar) => encode_scalar(scalar),
        ParameterValue::Sequence(elements) => encode_sequence(elements)?,
        ParameterValue::Mapping(entries) => encode_mapping(entries)?,
    };
    Ok(EncodedParameter(encoded))
}

/// Null is empty, booleans are `1`/`0` (SQL Server's `TRUE`/`FALSE`), the rest
/// use their text form.
///
/// Floats use Rust's shortest round-trip `Display` form, which never switches
/// to exponent notation: `1e21` encodes as `1000000000000000000000` and
/// `1e-7` as `0.0000001`. Pass a `Scalar::Text` for any other rendering.
pub fn encode_scalar(value: &Scalar) -> String {
    match value {
        Scalar::Null => String::new(),
        Scalar::Bool(true) => "1".to_string(),
        Scalar::Bool(false) => "0".to_string(),
        Scalar::Integer(i) => i.to_string(),
        Scalar::Float(f) => f.to_string(),
        Scalar::Text(s) => s.clone(),
    }
}

fn encode_sequence(elements: &[Scalar]) -> Result<String, EncodingError> {
    let mut encoded = Vec::with_capacity(elements.len());
    for (index, element) in elements.iter().enumerate() {
        let element = encode_scalar(element);
        if element.contains(',') {
            return Err(EncodingError::at(
                index.to_string(),
                EncodingError::SequenceSeparator {
                    encoded: Redacted::new(element),
                },
            ));
        }
        encoded.push(element);
    }
    Ok(encoded.join(","))
}

fn encode_mapping(entries: &[(String, Scalar)]) -> Result<String, EncodingError> {
    let mut encoded = Vec::with_capacity(entries.len());
    for (key, value) in entries {
        if has_mapping_separator(key) {
            return Err(EncodingError::at(key.clone(), EncodingError::MappingKey));
        }
        let value = encode_scalar(value);
        if has_mapping_separator(&value) {
            return Err(EncodingError::at(
                key.clone(),
                EncodingError::MappingSeparator {
                    encoded: Redacted::new(value),
                },
            ));
        }
        encoded.push(format!("{key}={value}"));
    }
    Ok(encoded.join(";"))
}

fn has_mapping_separator(s: &str) -> bool {
    s.contains(';') || s.contains('=')
}

// ---------------------------------------------------------------------------
// Dynamic values
// ---------------------------------------------------------------------------

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

impl TryFrom<&serde_json::Value> for Scalar {
    type Error = EncodingError;

    fn try_from(value: &serde_json::Value) -> Result<Self, Self::Error> {
        match value {
            serde_json::Value::Null => Ok(Scalar::Null),
            serde_json::Value::Bool(b) => Ok(Scalar::Bool(*b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Scalar::Integer(i))
                } else if n.is_u64() {
                    // Out of i64 range; keep the exact digits.
                    Ok(Scalar::Text(n.to_string()))
                } else {
                    Ok(Scalar::Float(n.as_f64().unwrap_or(f64::NAN)))
                }
            }
            serde_json::Value::String(s) => Ok(Scalar::Text(s.clone())),
            other => Err(EncodingError::UnsupportedType {
                kind: json_kind(other),
            }),
        }
    }
}

/// Arrays become sequences and objects become mappings. A collection nested
/// inside another is rejected with the offending index or key.
impl TryFrom<serde_json::Value> for ParameterValue {
    type Error = EncodingError;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        match value {
            serde_json::Value::Array(elements) => elements
                .iter()
                .enumerate()
                .map(|(index, element)| {
                    Scalar::try_from(element).map_err(|e| EncodingError::at(index.to_string(), e))
                })
                .collect::<Result<Vec<_>, _>>()
                .map(ParameterValue::Sequence),
            serde_json::Value::Object(entries) => entries
                .iter()
                .map(|(key, element)| {
                    Scalar::try_from(element)
                        .map(|scalar| (key.clone(), scalar))
                        .map_err(|e| EncodingError::at(key.clone(), e))
                })
                .collect::<Result<Vec<_>, _>>()
                .map(ParameterValue::Mapping),
            scalar => Scalar::try_from(&scalar).map(ParameterValue::Scalar),
        }
    }
}

/// Encode a dynamically typed value in one step.
pub fn encode_json(value: serde_json::Value) -> Result<EncodedParameter, EncodingError> {
    encode(&ParameterValue::try_from(value)?)
}
