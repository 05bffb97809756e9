//! JSON recovery — best-effort extraction of one JSON value from model output.
//!
//! Models asked for JSON still wrap it in markdown fences or surround it with
//! prose often enough that every caller needs the same cleanup. Strategies are
//! ordered from most to least precise; each runs only if the previous one
//! failed to produce a parseable value.

use serde_json::Value;
use thiserror::Error;

/// The accumulated buffer could not be parsed by any recovery strategy.
/// Carries the original text unmodified so callers can show what arrived.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("JSON decode failed: {message}")]
pub struct DecodeError {
    /// Parse error from the final attempted strategy.
    pub message: String,
    pub raw: String,
}

/// Attempts to decode `raw` as a single JSON value.
///
/// 1. Direct decode.
/// 2. Fence strip (``` or ```json) and retry.
/// 3. Substring from the first `{` to the last `}` inclusive. Known
///    limitation: a literal `}` inside a string value before the real
///    closing brace can defeat this; kept because it matches how lenient
///    extraction has always behaved here.
pub fn recover_json(raw: &str) -> Result<Value, DecodeError> {
    let mut last_error = match serde_json::from_str::<Value>(raw) {
        Ok(value) => return Ok(value),
        Err(e) => e.to_string(),
    };

    let stripped = strip_fences(raw);
    if stripped != raw.trim() {
        match serde_json::from_str::<Value>(stripped) {
            Ok(value) => return Ok(value),
            Err(e) => last_error = e.to_string(),
        }
    }

    if let Some(candidate) = brace_span(raw) {
        match serde_json::from_str::<Value>(candidate) {
            Ok(value) => return Ok(value),
            Err(e) => last_error = e.to_string(),
        }
    }

    Err(DecodeError {
        message: last_error,
        raw: raw.to_string(),
    })
}

/// Strips ```json ... ``` or ``` ... ``` code fences from model output.
fn strip_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

/// Returns the substring between the first `{` and the last `}` inclusive,
/// if both exist in that order.
fn brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end >= start).then(|| &text[start..=end])
}
