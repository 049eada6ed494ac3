//! Value codec
//!
//! Storage areas and cookies only hold strings. This module turns application
//! values into a single string and back, coercing booleans, numbers and JSON
//! on the way out. Decoding never fails: anything it cannot interpret comes
//! back as text.

mod value;

pub use value::Value;

use serde_json::Value as Json;
use tracing::debug;

/// Encode a value into its stored string form
pub fn encode(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => format_number(*n),
        Value::Text(s) => s.clone(),
        Value::Structured(json) => json.to_string(),
    }
}

/// Decode a stored string
///
/// Returns `None` for the `undefined` sentinel. Rules are applied in order:
/// `null`, booleans, numbers, JSON objects/arrays, then plain text.
pub fn decode(raw: &str) -> Option<Value> {
    match raw {
        "undefined" => return None,
        "null" => return Some(Value::Null),
        "true" => return Some(Value::Bool(true)),
        "false" => return Some(Value::Bool(false)),
        _ => {}
    }

    if let Some(n) = parse_number(raw) {
        return Some(Value::Number(n));
    }

    if raw.starts_with('{') || raw.starts_with('[') {
        return Some(match decode_structured(raw) {
            Ok(json) => Value::Structured(json),
            Err(e) => {
                debug!("Keeping undecodable JSON as text: {}", e);
                Value::Text(raw.to_string())
            }
        });
    }

    Some(Value::Text(raw.to_string()))
}

/// Parse an object or array
pub fn decode_structured(raw: &str) -> Result<Json, serde_json::Error> {
    serde_json::from_str(raw)
}

/// Parse a numeric-looking string
///
/// Accepts what a JavaScript `Number()` conversion accepts for decimal input:
/// optional sign, digits, fraction, exponent, or `Infinity`. Surrounding
/// whitespace is ignored; an all-whitespace string is not a number.
fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let unsigned = trimmed.strip_prefix(|c: char| c == '+' || c == '-').unwrap_or(trimmed);
    if unsigned == "Infinity" {
        return Some(if trimmed.starts_with('-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        });
    }

    // f64::from_str also takes "inf" and "nan"
    if !unsigned.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
        return None;
    }

    trimmed.parse::<f64>().ok()
}

/// Format a number the way it reads back: integers without a fraction
pub(crate) fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else {
        n.to_string()
    }
}
