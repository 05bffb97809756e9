//! Structured result resolver — turns a completed text buffer into a
//! validated record or a typed error record.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::llm::TransportError;
use crate::structured::recovery::recover_json;
use crate::structured::shape::OutputShape;

/// Failure taxonomy for one structured call. All kinds are terminal; nothing
/// is retried internally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Provider call failed or the connection dropped mid-stream.
    Transport,
    /// The full buffer could not be parsed as JSON by any recovery strategy.
    Decode,
    /// The buffer decoded to JSON that does not conform to the bound shape.
    Validation,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Transport => "transport",
            ErrorKind::Decode => "decode",
            ErrorKind::Validation => "validation",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed error record returned (never thrown opaquely) so callers can inspect
/// the kind and show the raw buffer to the user as a fallback.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{kind} failure: {message}")]
pub struct ErrorRecord {
    pub kind: ErrorKind,
    pub message: String,
    /// What was actually received, unmodified. For transport failures this is
    /// whatever arrived before the connection dropped.
    pub raw_buffer: String,
}

impl ErrorRecord {
    pub fn transport(error: &TransportError, raw_buffer: String) -> Self {
        Self {
            kind: ErrorKind::Transport,
            message: error.to_string(),
            raw_buffer,
        }
    }
}

/// Validated structured output: exactly the bound shape's fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedRecord {
    /// Name of the shape this record was validated against.
    pub shape: &'static str,
    pub fields: Map<String, Value>,
}

impl ResolvedRecord {
    pub fn to_json(&self) -> Value {
        Value::Object(self.fields.clone())
    }

    /// Deserializes the validated fields into a typed struct.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.to_json())
    }
}

/// Resolves a completed buffer against a shape: recover JSON, then validate.
pub fn resolve(raw: &str, shape: &OutputShape) -> Result<ResolvedRecord, ErrorRecord> {
    let value = recover_json(raw).map_err(|e| ErrorRecord {
        kind: ErrorKind::Decode,
        message: e.message,
        raw_buffer: e.raw,
    })?;

    let fields = shape.validate(&value).map_err(|e| ErrorRecord {
        kind: ErrorKind::Validation,
        message: e.to_string(),
        raw_buffer: raw.to_string(),
    })?;

    Ok(ResolvedRecord {
        shape: shape.name,
        fields,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structured::shape::FieldKind;

    fn analysis_shape() -> OutputShape {
        OutputShape::new("jd_analysis")
            .field("thinking", FieldKind::OptionalString)
            .field(
                "overall_score",
                FieldKind::Integer {
                    min: Some(0),
                    max: Some(100),
                },
            )
            .field("key_recommendations", FieldKind::StringArray)
            .field("improvements", FieldKind::ObjectArray)
    }

    #[test]
    fn test_resolve_bare_json() {
        let raw = r#"{"overall_score": 72, "key_recommendations": ["x"], "improvements": []}"#;
        let record = resolve(raw, &analysis_shape()).unwrap();
        assert_eq!(record.shape, "jd_analysis");
        assert_eq!(record.fields["overall_score"], 72);
        assert_eq!(record.fields["thinking"], Value::Null);
    }

    #[test]
    fn test_resolve_fenced_json() {
        let raw = "Here is the result:\n```json\n{\"overall_score\": 80, \"key_recommendations\": [], \"improvements\": []}\n```";
        let record = resolve(raw, &analysis_shape()).unwrap();
        assert_eq!(record.fields["overall_score"], 80);
    }

    #[test]
    fn test_resolve_json_in_prose() {
        let raw = r#"Sure! {"overall_score": 55, "key_recommendations": ["Add more detail"], "improvements": []} Hope that helps."#;
        let record = resolve(raw, &analysis_shape()).unwrap();
        assert_eq!(record.fields["overall_score"], 55);
        assert_eq!(record.fields["key_recommendations"][0], "Add more detail");
    }

    #[test]
    fn test_decode_failure_carries_exact_raw_text() {
        let raw = "not json at all";
        let err = resolve(raw, &analysis_shape()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Decode);
        assert_eq!(err.raw_buffer, raw);
    }

    #[test]
    fn test_validation_failure_on_missing_field() {
        let raw = r#"{"key_recommendations": [], "improvements": []}"#;
        let err = resolve(raw, &analysis_shape()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert!(err.message.contains("overall_score"));
        assert_eq!(err.raw_buffer, raw);
    }

    #[test]
    fn test_validation_failure_on_out_of_range() {
        let raw = r#"{"overall_score": 150, "key_recommendations": [], "improvements": []}"#;
        let err = resolve(raw, &analysis_shape()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    /// Parser/validator stability: serializing a resolved record back to text
    /// and resolving it again yields an equal record.
    #[test]
    fn test_round_trip_is_stable() {
        let raw = r#"{"thinking": "hm", "overall_score": 64, "key_recommendations": ["a", "b"], "improvements": [{"section": "s", "original": "o", "improved": "i", "reason": "r"}]}"#;
        let shape = analysis_shape();
        let first = resolve(raw, &shape).unwrap();

        let serialized = serde_json::to_string(&first.to_json()).unwrap();
        let second = resolve(&serialized, &shape).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_parse_into_typed_struct() {
        #[derive(serde::Deserialize)]
        struct Analysis {
            thinking: Option<String>,
            overall_score: i64,
        }

        let raw = r#"{"overall_score": 90, "key_recommendations": [], "improvements": []}"#;
        let record = resolve(raw, &analysis_shape()).unwrap();
        let typed: Analysis = record.parse().unwrap();
        assert_eq!(typed.overall_score, 90);
        assert!(typed.thinking.is_none());
    }
}
