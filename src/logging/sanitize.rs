//! Error sanitization
//!
//! Produces a JSON copy of an error with credential-like keys redacted.

use crate::constants::{REDACTED, SANITIZE_MAX_DEPTH, SENSITIVE_KEYS};
use serde_json::{Map, Value};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SanitizeError {
    /// Nesting exceeded `SANITIZE_MAX_DEPTH` (self-referential payloads end up here)
    TooDeep { depth: usize },
}

impl fmt::Display for SanitizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooDeep { depth } => write!(f, "error payload nested deeper than {}", depth),
        }
    }
}

impl std::error::Error for SanitizeError {}

/// True when `key` names a credential (case-insensitive)
pub fn is_sensitive(key: &str) -> bool {
    let lower = key.to_ascii_lowercase();
    SENSITIVE_KEYS.contains(&lower.as_str())
}

/// Deep copy of `value` with every sensitive key's value replaced by the marker
///
/// Idempotent: sanitizing the output again yields the same value.
pub fn sanitize(value: &Value) -> Result<Value, SanitizeError> {
    sanitize_at(value, 0)
}

fn sanitize_at(value: &Value, depth: usize) -> Result<Value, SanitizeError> {
    if depth > SANITIZE_MAX_DEPTH {
        return Err(SanitizeError::TooDeep {
            depth: SANITIZE_MAX_DEPTH,
        });
    }

    match value {
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (k, v) in map {
                let cleaned = if is_sensitive(k) {
                    Value::String(REDACTED.to_string())
                } else {
                    sanitize_at(v, depth + 1)?
                };
                out.insert(k.clone(), cleaned);
            }
            Ok(Value::Object(out))
        }
        Value::Array(items) => items
            .iter()
            .map(|v| sanitize_at(v, depth + 1))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        other => Ok(other.clone()),
    }
}

/// Sanitize an error payload for `technical.rawError`
///
/// Scalars are wrapped as `{ "value": .. }`. On failure a minimal
/// `{ errorMessage, errorName }` descriptor is returned instead.
pub fn sanitize_error_payload(payload: &Value, name: &str, message: &str) -> Value {
    let wrapped;
    let target = match payload {
        Value::Object(_) | Value::Array(_) => payload,
        Value::Null => return Value::Null,
        scalar => {
            wrapped = serde_json::json!({ "value": scalar });
            &wrapped
        }
    };

    match sanitize(target) {
        Ok(clean) => clean,
        Err(e) => {
            tracing::debug!("Error payload sanitization failed: {}", e);
            serde_json::json!({
                "errorMessage": if message.is_empty() { "Unknown error" } else { message },
                "errorName": if name.is_empty() { "Error" } else { name },
            })
        }
    }
}
