//! Raw JSON to native scalar conversion. Header, path and query values arrive
//! as strings, so numeric and boolean targets also accept their textual form.

use serde_json::Value as JsonValue;

use super::ValueError;

pub fn kind_name(raw: &JsonValue) -> &'static str {
    match raw {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

fn failed(expected: &str, raw: &JsonValue) -> ValueError {
    ValueError::TypeConversionFailed {
        expected: expected.to_string(),
        found: match raw {
            JsonValue::String(s) => format!("string '{s}'"),
            JsonValue::Number(n) => format!("number {n}"),
            other => kind_name(other).to_string(),
        },
    }
}

pub fn to_int(raw: &JsonValue) -> Result<i64, ValueError> {
    match raw {
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Ok(i);
            }
            if n.is_u64() {
                return Err(failed("integer", raw));
            }
            // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive
            match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
                    Ok(f as i64)
                }
                _ => Err(failed("integer", raw)),
            }
        }
        JsonValue::String(s) => s.trim().parse::<i64>().map_err(|_| failed("integer", raw)),
        _ => Err(failed("integer", raw)),
    }
}

pub fn to_float(raw: &JsonValue) -> Result<f64, ValueError> {
    match raw {
        JsonValue::Number(n) => n.as_f64().ok_or_else(|| failed("float", raw)),
        JsonValue::String(s) => match s.trim().parse::<f64>() {
            Ok(f) if f.is_finite() => Ok(f),
            _ => Err(failed("float", raw)),
        },
        _ => Err(failed("float", raw)),
    }
}

pub fn to_bool(raw: &JsonValue) -> Result<bool, ValueError> {
    match raw {
        JsonValue::Bool(b) => Ok(*b),
        JsonValue::String(s) => match s.trim() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(failed("boolean", raw)),
        },
        _ => Err(failed("boolean", raw)),
    }
}

pub fn to_string(raw: &JsonValue) -> Result<String, ValueError> {
    match raw {
        JsonValue::String(s) => Ok(s.clone()),
        JsonValue::Number(n) => Ok(n.to_string()),
        JsonValue::Bool(b) => Ok(b.to_string()),
        _ => Err(failed("string", raw)),
    }
}
