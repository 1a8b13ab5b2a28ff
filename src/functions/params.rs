// Typed parameter parsing
// All parameters are parsed and validated before any concurrent work starts.

use serde_json::{Map, Value};

use crate::error::HandlerError;
use crate::http::FunctionRequest;

/// Parse an optional numeric query parameter, falling back to `default`
pub fn query_number(raw: Option<&str>, name: &str, default: f64) -> Result<f64, HandlerError> {
    match raw {
        None => Ok(default),
        Some(text) => parse_float(text.trim())
            .ok_or_else(|| HandlerError::validation(format!("Invalid number for '{name}': {text}"))),
    }
}

/// Parse an optional non-negative integer query parameter
pub fn query_count(raw: Option<&str>, name: &str, default: usize) -> Result<usize, HandlerError> {
    match raw {
        None => Ok(default),
        Some(text) => text.trim().parse::<usize>().map_err(|_| {
            HandlerError::validation(format!(
                "Invalid value for '{name}': expected a non-negative integer, got {text}"
            ))
        }),
    }
}

/// Read a JSON field as a number; numeric strings are accepted
pub fn json_number(value: &Value, name: &str) -> Result<f64, HandlerError> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_float(s.trim()),
        _ => None,
    };
    parsed.ok_or_else(|| HandlerError::validation(format!("Invalid number for '{name}': {value}")))
}

/// Read an optional JSON field as a number, falling back to `default`
pub fn json_number_or(
    body: &Map<String, Value>,
    name: &str,
    default: f64,
) -> Result<f64, HandlerError> {
    body.get(name)
        .map_or(Ok(default), |value| json_number(value, name))
}

/// Read an optional JSON field as display text, falling back to `default`
pub fn json_text_or(body: &Map<String, Value>, name: &str, default: &str) -> String {
    match body.get(name) {
        None | Some(Value::Null) => default.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Require a non-empty JSON object body
///
/// An absent, malformed or empty body is "No JSON data provided"; any other
/// JSON kind is rejected because metadata can only be merged into an object.
pub fn json_object(req: &FunctionRequest) -> Result<Map<String, Value>, HandlerError> {
    match req.json() {
        Some(Value::Object(body)) if !body.is_empty() => Ok(body),
        None | Some(Value::Null | Value::Bool(false)) => Err(no_json()),
        Some(Value::Object(_)) => Err(no_json()),
        Some(Value::Array(items)) if items.is_empty() => Err(no_json()),
        Some(Value::String(text)) if text.is_empty() => Err(no_json()),
        Some(other) => Err(HandlerError::validation(format!(
            "JSON body must be an object, got {}",
            json_kind(&other)
        ))),
    }
}

fn no_json() -> HandlerError {
    HandlerError::validation("No JSON data provided")
}

/// Name of a JSON value's kind
pub const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn parse_float(text: &str) -> Option<f64> {
    text.parse::<f64>().ok().filter(|v| v.is_finite())
}
