//! Lenient conversions shared by snapshot parsing and form collection.
//!
//! Nothing in here fails: malformed input always collapses to the
//! caller-supplied default.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Reads an optional sign followed by decimal digits from the start of
/// `text`, ignoring leading whitespace and anything after the digits.
pub fn leading_int(text: &str) -> Option<i64> {
    let s = text.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }

    let magnitude: i64 = digits[..end].parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

/// Integer from form text. Blank, unparsable and zero all give `default`.
pub fn int_or(text: &str, default: i64) -> i64 {
    match leading_int(text) {
        Some(0) | None => default,
        Some(v) => v,
    }
}

/// Integer from a loosely typed snapshot value, same rule as [`int_or`].
pub fn value_int_or(value: &Value, default: i64) -> i64 {
    let parsed = match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite())
                .map(|f| f.trunc() as i64)
        }),
        Value::String(s) => leading_int(s),
        _ => None,
    };

    match parsed {
        Some(0) | None => default,
        Some(v) => v,
    }
}

pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

pub fn value_flag(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => matches!(s.trim(), "true" | "True" | "1"),
        _ => false,
    }
}

/// `null` and absent sections deserialize to `T::default()`.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
