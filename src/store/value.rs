//! Loose value semantics
//!
//! Clients are mostly dynamic-language programs that send `"1"` where they
//! mean `1`, so comparisons and flag reads coerce the way those clients
//! expect: numeric strings compare numerically, flags are read by
//! truthiness.

use serde_json::{Number, Value};

/// Loose equality between two JSON values
///
/// - numbers and numeric strings compare by numeric value
/// - a non-numeric string equals a number only when it is that number's text
/// - booleans compare by truthiness of the other side
/// - null equals `false`, `0`, `""` and empty containers
/// - arrays and objects compare element-wise with the same rules
pub fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Null, Value::String(s)) | (Value::String(s), Value::Null) => s.is_empty(),
        (Value::Null, other) | (other, Value::Null) => !is_truthy(other),
        (Value::Bool(x), other) | (other, Value::Bool(x)) => *x == is_truthy(other),
        (Value::Number(x), Value::Number(y)) => numbers_eq(x, y),
        (Value::Number(n), Value::String(s)) | (Value::String(s), Value::Number(n)) => {
            match numeric_value(s) {
                Some(parsed) => numbers_eq(n, &parsed),
                None => n.to_string() == *s,
            }
        }
        (Value::String(x), Value::String(y)) => match (numeric_value(x), numeric_value(y)) {
            (Some(nx), Some(ny)) => numbers_eq(&nx, &ny),
            _ => x == y,
        },
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(l, r)| loose_eq(l, r))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter()
                    .all(|(field, l)| y.get(field).is_some_and(|r| loose_eq(l, r)))
        }
        _ => false,
    }
}

/// Truthiness of a JSON value
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !(s.is_empty() || s == "0"),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Integer form of an id-like value
///
/// Integers pass through, floats truncate, numeric strings are parsed.
/// Anything else is not an id.
pub fn coerce_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => {
            let trimmed = s.trim();
            trimmed
                .parse::<i64>()
                .ok()
                .or_else(|| numeric_value(trimmed).and_then(|n| coerce_int(&Value::Number(n))))
        }
        _ => None,
    }
}

/// Parse a numeric-looking string (`"12"`, `" 3.5"`, `"-1e3"`)
///
/// Words the float parser would accept (`inf`, `NaN`) are not numeric here.
fn numeric_value(s: &str) -> Option<Number> {
    let s = s.trim();
    if s.is_empty() || !s.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }
    if !s
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'))
    {
        return None;
    }
    if let Ok(i) = s.parse::<i64>() {
        return Some(Number::from(i));
    }
    s.parse::<f64>().ok().and_then(Number::from_f64)
}

fn numbers_eq(x: &Number, y: &Number) -> bool {
    if let (Some(a), Some(b)) = (x.as_i64(), y.as_i64()) {
        return a == b;
    }
    if let (Some(a), Some(b)) = (x.as_u64(), y.as_u64()) {
        return a == b;
    }
    match (x.as_f64(), y.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}
