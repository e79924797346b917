//! Value normalization
//!
//! One canonical notion of "empty" and "equal" for every engine. All
//! comparison paths (diffing, change detection, completion scoring) go
//! through [`normalize`] so that `"Yes"` and `true`, `5` and `5.0`, or a
//! padded and an unpadded string can never read as a user-visible change.

use serde_json::{Map, Value};

/// Boolean words accepted in string form, compared trimmed and lowercased.
const TRUE_WORDS: [&str; 2] = ["yes", "true"];
const FALSE_WORDS: [&str; 2] = ["no", "false"];

/// Reduce a value to canonical form, or `None` when it is empty.
///
/// Rules:
/// - null is empty
/// - strings are trimmed; empty after trimming is empty; `yes`/`true` and
///   `no`/`false` (case-insensitive) become booleans
/// - numbers keep their magnitude; integral floats collapse to integers so
///   `5` and `5.0` compare equal
/// - arrays keep their arity; members normalize individually with empty
///   slots becoming null; only a zero-length array is empty
/// - objects drop empty members and are empty once memberless
/// - booleans are never empty
#[must_use]
pub fn normalize(value: &Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(Value::Bool(*b)),
        Value::Number(n) => Some(canonical_number(n)),
        Value::String(s) => normalize_string(s),
        Value::Array(items) => {
            if items.is_empty() {
                return None;
            }
            let members = items
                .iter()
                .map(|item| normalize(item).unwrap_or(Value::Null))
                .collect();
            Some(Value::Array(members))
        }
        Value::Object(map) => {
            let mut members = Map::new();
            for (key, member) in map {
                if let Some(normalized) = normalize(member) {
                    members.insert(key.clone(), normalized);
                }
            }
            if members.is_empty() {
                None
            } else {
                Some(Value::Object(members))
            }
        }
    }
}

fn normalize_string(s: &str) -> Option<Value> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lowered = trimmed.to_lowercase();
    if TRUE_WORDS.contains(&lowered.as_str()) {
        return Some(Value::Bool(true));
    }
    if FALSE_WORDS.contains(&lowered.as_str()) {
        return Some(Value::Bool(false));
    }
    Some(Value::String(trimmed.to_string()))
}

#[allow(clippy::cast_possible_truncation)]
fn canonical_number(n: &serde_json::Number) -> Value {
    // Exact integer range of f64; beyond 2^53 integrality is not reliable.
    const EXACT_INT_RANGE: f64 = 9_007_199_254_740_992.0;

    if let Some(i) = n.as_i64() {
        return Value::Number(i.into());
    }
    if let Some(u) = n.as_u64() {
        return Value::Number(u.into());
    }
    if let Some(f) = n.as_f64() {
        if f.fract() == 0.0 && f.abs() <= EXACT_INT_RANGE {
            return Value::Number((f as i64).into());
        }
        if let Some(num) = serde_json::Number::from_f64(f) {
            return Value::Number(num);
        }
    }
    Value::Number(n.clone())
}

/// True when a value normalizes to nothing
#[inline]
#[must_use]
pub fn is_empty_value(value: &Value) -> bool {
    normalize(value).is_none()
}

/// Semantic equality: both empty, or equal after normalization
#[must_use]
pub fn values_equal(a: &Value, b: &Value) -> bool {
    normalize(a) == normalize(b)
}

/// True for numeric zero in any representation
#[must_use]
pub fn is_zero_number(value: &Value) -> bool {
    match value {
        Value::Number(n) => n.as_f64() == Some(0.0),
        _ => false,
    }
}
