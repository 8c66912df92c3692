//! Typed coercion over the dynamically-typed wire payloads.
//!
//! Property values arrive as [`serde_json::Value`] and are coerced at the
//! last moment, inside the setter that declared the semantic type. A failed
//! coercion is an error scoped to that one property, never a panic.

use serde_json::Value;

use crate::error::CoerceError;

pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn mismatch(prop: &str, expected: &'static str, value: &Value) -> CoerceError {
    CoerceError {
        prop: prop.to_string(),
        expected,
        found: type_name(value),
    }
}

pub fn expect_f64(prop: &str, value: &Value) -> Result<f64, CoerceError> {
    value
        .as_f64()
        .ok_or_else(|| mismatch(prop, "number", value))
}

/// Numeric props without a declared default reset to zero, the way a
/// value-typed setter slot behaves when the wire sends an explicit null.
pub fn f64_or(prop: &str, value: &Value, fallback: f64) -> Result<f64, CoerceError> {
    if value.is_null() {
        return Ok(fallback);
    }
    expect_f64(prop, value)
}

pub fn expect_bool(prop: &str, value: &Value) -> Result<bool, CoerceError> {
    value
        .as_bool()
        .ok_or_else(|| mismatch(prop, "bool", value))
}

pub fn bool_or(prop: &str, value: &Value, fallback: bool) -> Result<bool, CoerceError> {
    if value.is_null() {
        return Ok(fallback);
    }
    expect_bool(prop, value)
}

pub fn expect_str<'v>(prop: &str, value: &'v Value) -> Result<&'v str, CoerceError> {
    value
        .as_str()
        .ok_or_else(|| mismatch(prop, "string", value))
}

pub fn str_or<'v>(
    prop: &str,
    value: &'v Value,
    fallback: &'v str,
) -> Result<&'v str, CoerceError> {
    if value.is_null() {
        return Ok(fallback);
    }
    expect_str(prop, value)
}

pub fn i32_or(prop: &str, value: &Value, fallback: i32) -> Result<i32, CoerceError> {
    Ok(f64_or(prop, value, fallback as f64)? as i32)
}

pub fn expect_array<'v>(prop: &str, value: &'v Value) -> Result<&'v [Value], CoerceError> {
    value
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| mismatch(prop, "array", value))
}
