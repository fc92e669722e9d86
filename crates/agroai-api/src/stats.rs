// Canonical sensor-value parsing.
//
// The stats bag arrives loosely typed: numbers, numeric strings, nulls,
// missing keys, and the literal "string" left behind by an unfilled
// OpenAPI example. Every consumer goes through `parse_stat`.

use serde_json::Value;

/// Placeholder text the backend emits for stats it never filled in.
pub const PLACEHOLDER: &str = "string";

/// Parse a raw stat into a finite reading.
///
/// Returns `Some` only for a finite JSON number, or for a string that is
/// non-blank, not [`PLACEHOLDER`], and parses to a finite `f64`. Zero is
/// a valid reading and is returned as `Some(0.0)`.
pub fn parse_stat(raw: Option<&Value>) -> Option<f64> {
    match raw? {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => parse_stat_str(s),
        _ => None,
    }
}

/// String form of [`parse_stat`].
pub fn parse_stat_str(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == PLACEHOLDER {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn numbers_pass_through() {
        assert_eq!(parse_stat(Some(&json!(0))), Some(0.0));
        assert_eq!(parse_stat(Some(&json!(21))), Some(21.0));
        assert_eq!(parse_stat(Some(&json!(-3.5))), Some(-3.5));
    }

    #[test]
    fn numeric_strings_parse() {
        assert_eq!(parse_stat(Some(&json!("24.5"))), Some(24.5));
        assert_eq!(parse_stat(Some(&json!(" 61 "))), Some(61.0));
        assert_eq!(parse_stat(Some(&json!("0"))), Some(0.0));
    }

    #[test]
    fn placeholders_and_blanks_are_unknown() {
        assert_eq!(parse_stat(Some(&json!("string"))), None);
        assert_eq!(parse_stat(Some(&json!(""))), None);
        assert_eq!(parse_stat(Some(&json!("   "))), None);
        assert_eq!(parse_stat(Some(&Value::Null)), None);
        assert_eq!(parse_stat(None), None);
    }

    #[test]
    fn garbage_is_unknown() {
        assert_eq!(parse_stat(Some(&json!("warm"))), None);
        assert_eq!(parse_stat(Some(&json!("NaN"))), None);
        assert_eq!(parse_stat(Some(&json!("inf"))), None);
        assert_eq!(parse_stat(Some(&json!(true))), None);
        assert_eq!(parse_stat(Some(&json!({"v": 1}))), None);
    }
}
