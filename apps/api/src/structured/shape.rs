//! Output shapes — declarative schemas for structured agent responses.
//!
//! A shape is an ordered list of named, typed fields with constraint
//! metadata, checked by a small hand-rolled validator. Validation is shallow:
//! field presence, type, and integer range. Elements of an `ObjectArray` are
//! only checked to be objects; their inner fields are left to the typed
//! deserialization layer.

use serde_json::{Map, Value};
use thiserror::Error;

/// Declared type and constraints for one field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    String,
    /// Integer with optional inclusive bounds.
    Integer { min: Option<i64>, max: Option<i64> },
    StringArray,
    ObjectArray,
    Object,
    /// String that may be missing or null; defaults to null.
    OptionalString,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

/// Immutable schema bound to one agent kind.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputShape {
    pub name: &'static str,
    pub fields: Vec<FieldSpec>,
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    #[error("Expected a JSON object, got {0}")]
    NotAnObject(&'static str),

    #[error("Missing required field '{field}'")]
    MissingField { field: &'static str },

    #[error("Field '{field}' has wrong type: expected {expected}, got {got}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
        got: &'static str,
    },

    #[error("Field '{field}' out of range: {value} not in [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },
}

impl OutputShape {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, name: &'static str, kind: FieldKind) -> Self {
        self.fields.push(FieldSpec { name, kind });
        self
    }

    /// Validates a decoded JSON value against this shape.
    ///
    /// Returns exactly the declared fields with validated values. Unknown
    /// extra fields in the input are ignored. Optional fields missing from
    /// the input are filled with their default (null). Out-of-range integers
    /// are rejected, never clamped.
    pub fn validate(&self, value: &Value) -> Result<Map<String, Value>, ValidationError> {
        let object = value
            .as_object()
            .ok_or_else(|| ValidationError::NotAnObject(json_kind(value)))?;

        let mut validated = Map::new();
        for spec in &self.fields {
            let field_value = self.validate_field(spec, object.get(spec.name))?;
            validated.insert(spec.name.to_string(), field_value);
        }
        Ok(validated)
    }

    fn validate_field(
        &self,
        spec: &FieldSpec,
        value: Option<&Value>,
    ) -> Result<Value, ValidationError> {
        let wrong_type = |expected: &'static str, got: &Value| ValidationError::WrongType {
            field: spec.name,
            expected,
            got: json_kind(got),
        };

        match (&spec.kind, value) {
            (FieldKind::OptionalString, None | Some(Value::Null)) => Ok(Value::Null),
            (FieldKind::OptionalString, Some(v @ Value::String(_))) => Ok(v.clone()),
            (FieldKind::OptionalString, Some(v)) => Err(wrong_type("string or null", v)),

            (_, None) => Err(ValidationError::MissingField { field: spec.name }),

            (FieldKind::String, Some(v @ Value::String(_))) => Ok(v.clone()),
            (FieldKind::String, Some(v)) => Err(wrong_type("string", v)),

            (FieldKind::Integer { min, max }, Some(v)) => {
                let n = v.as_i64().ok_or_else(|| wrong_type("integer", v))?;
                let lo = min.unwrap_or(i64::MIN);
                let hi = max.unwrap_or(i64::MAX);
                if n < lo || n > hi {
                    return Err(ValidationError::OutOfRange {
                        field: spec.name,
                        value: n,
                        min: lo,
                        max: hi,
                    });
                }
                Ok(v.clone())
            }

            (FieldKind::StringArray, Some(v @ Value::Array(items))) => {
                for item in items {
                    if !item.is_string() {
                        return Err(wrong_type("array of strings", item));
                    }
                }
                Ok(v.clone())
            }
            (FieldKind::StringArray, Some(v)) => Err(wrong_type("array of strings", v)),

            (FieldKind::ObjectArray, Some(v @ Value::Array(items))) => {
                for item in items {
                    if !item.is_object() {
                        return Err(wrong_type("array of objects", item));
                    }
                }
                Ok(v.clone())
            }
            (FieldKind::ObjectArray, Some(v)) => Err(wrong_type("array of objects", v)),

            (FieldKind::Object, Some(v @ Value::Object(_))) => Ok(v.clone()),
            (FieldKind::Object, Some(v)) => Err(wrong_type("object", v)),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
