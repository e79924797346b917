//! Lenient completeness-percent parsing
//!
//! Older snapshots stored the completeness score inside the content map,
//! sometimes as a string, occasionally as garbage. Reads must never fail on
//! it, so parsing degrades to zero instead of erroring.

use serde_json::Value;

/// Parse a stored completeness percent from any historical encoding.
///
/// Numbers truncate toward zero, numeric strings parse then truncate, and
/// everything else (booleans included) is 0. No clamping is applied; the
/// score writers keep the value in range.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn parse_lenient(value: &Value) -> i64 {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i
            } else if let Some(f) = n.as_f64() {
                f.trunc() as i64
            } else {
                0
            }
        }
        Value::String(s) => match s.trim().parse::<f64>() {
            Ok(f) if f.is_finite() => f.trunc() as i64,
            _ => 0,
        },
        _ => 0,
    }
}
