//! # Plain Scalar Resolution
//!
//! Core-schema inference for untagged plain scalars, tried in the order
//! null, bool, int, float, and finally string.
//!
//! | Kind | Accepted text |
//! |---|---|
//! | null | empty, `~`, `null`, `Null`, `NULL` |
//! | bool | `true`, `True`, `TRUE`, `false`, `False`, `FALSE` |
//! | int | `[-+]?[0-9]+`, `0o[0-7]+`, `0x[0-9a-fA-F]+`, `0b[01]+` |
//! | float | `[-+]?(\.[0-9]+|[0-9]+(\.[0-9]*)?)([eE][-+]?[0-9]+)?`, `[-+]?.inf`, `.nan` |
//!
//! A decimal integer that does not fit in `i64` resolves as a float.
//! Timestamps are never inferred; they require the `!!timestamp` tag.

use crate::value::{Value, ValueKind};

/// Resolve an untagged plain scalar to a value.
pub fn resolve_plain(text: &str) -> Value {
    if is_null(text) {
        Value::Null
    } else if let Some(b) = parse_bool(text) {
        Value::Bool(b)
    } else if let Some(i) = parse_int(text) {
        Value::Int(i)
    } else if let Some(x) = parse_float(text) {
        Value::Float(x)
    } else {
        Value::String(text.to_string())
    }
}

/// The kind an untagged plain scalar would resolve to.
pub fn plain_kind(text: &str) -> ValueKind {
    if is_null(text) {
        ValueKind::Null
    } else if parse_bool(text).is_some() {
        ValueKind::Bool
    } else if parse_int(text).is_some() {
        ValueKind::Int
    } else if parse_float(text).is_some() {
        ValueKind::Float
    } else {
        ValueKind::String
    }
}

/// Whether the text is a core-schema null.
pub fn is_null(text: &str) -> bool {
    matches!(text, "" | "~" | "null" | "Null" | "NULL")
}

/// Parse a core-schema boolean.
pub fn parse_bool(text: &str) -> Option<bool> {
    match text {
        "true" | "True" | "TRUE" => Some(true),
        "false" | "False" | "FALSE" => Some(false),
        _ => None,
    }
}

/// Parse a core-schema integer.
pub fn parse_int(text: &str) -> Option<i64> {
    let radix_digits = |prefix: &str, radix: u32| {
        text.strip_prefix(prefix)
            .filter(|digits| !digits.is_empty() && digits.chars().all(|c| c.is_digit(radix)))
            .and_then(|digits| i64::from_str_radix(digits, radix).ok())
    };
    if let Some(i) = radix_digits("0x", 16) {
        return Some(i);
    }
    if let Some(i) = radix_digits("0o", 8) {
        return Some(i);
    }
    if let Some(i) = radix_digits("0b", 2) {
        return Some(i);
    }
    let digits = text.strip_prefix(['-', '+']).unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse::<i64>().ok()
}

/// Parse a core-schema float.
pub fn parse_float(text: &str) -> Option<f64> {
    match text {
        ".inf" | ".Inf" | ".INF" | "+.inf" | "+.Inf" | "+.INF" => return Some(f64::INFINITY),
        "-.inf" | "-.Inf" | "-.INF" => return Some(f64::NEG_INFINITY),
        ".nan" | ".NaN" | ".NAN" => return Some(f64::NAN),
        _ => {}
    }
    if !is_decimal_float(text) {
        return None;
    }
    text.parse::<f64>().ok()
}

fn is_decimal_float(text: &str) -> bool {
    let bytes = text.as_bytes();
    let mut i = 0;
    if matches!(bytes.first(), Some(b'-' | b'+')) {
        i += 1;
    }
    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let int_digits = i - int_start;
    let mut frac_digits = 0;
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        let frac_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        frac_digits = i - frac_start;
    }
    if int_digits == 0 && frac_digits == 0 {
        return false;
    }
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        i += 1;
        if matches!(bytes.get(i), Some(b'-' | b'+')) {
            i += 1;
        }
        let exp_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == exp_start {
            return false;
        }
    }
    i == bytes.len()
}

/// Render a float so that it resolves back to a float: the text always
/// carries a `.`, an exponent, or one of `.inf`, `-.inf`, `.nan`.
pub fn format_float(x: f64) -> String {
    if x.is_nan() {
        return ".nan".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { ".inf" } else { "-.inf" }.to_string();
    }
    let abs = x.abs();
    let mut text = if abs != 0.0 && !(1e-4..1e16).contains(&abs) {
        format!("{x:e}")
    } else {
        format!("{x}")
    };
    if !text.contains(['.', 'e', 'E']) {
        text.push_str(".0");
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nulls() {
        for text in ["", "~", "null", "Null", "NULL"] {
            assert_eq!(resolve_plain(text), Value::Null, "{text:?}");
        }
        assert_eq!(resolve_plain("nULL"), Value::from("nULL"));
    }

    #[test]
    fn bools() {
        assert_eq!(resolve_plain("True"), Value::Bool(true));
        assert_eq!(resolve_plain("FALSE"), Value::Bool(false));
        assert_eq!(resolve_plain("yes"), Value::from("yes"));
    }

    #[test]
    fn ints() {
        assert_eq!(parse_int("23"), Some(23));
        assert_eq!(parse_int("-23"), Some(-23));
        assert_eq!(parse_int("+7"), Some(7));
        assert_eq!(parse_int("0x1F"), Some(31));
        assert_eq!(parse_int("0o17"), Some(15));
        assert_eq!(parse_int("0b101"), Some(5));
        assert_eq!(parse_int("0x"), None);
        assert_eq!(parse_int("1_000"), None);
        assert_eq!(parse_int("12a"), None);
    }

    #[test]
    fn int_overflow_becomes_float() {
        let v = resolve_plain("99999999999999999999");
        assert!(matches!(v, Value::Float(_)));
    }

    #[test]
    fn floats() {
        assert_eq!(parse_float("3.14"), Some(3.14));
        assert_eq!(parse_float(".5"), Some(0.5));
        assert_eq!(parse_float("1."), Some(1.0));
        assert_eq!(parse_float("-1e3"), Some(-1000.0));
        assert_eq!(parse_float("2.5E-2"), Some(0.025));
        assert_eq!(parse_float("-.inf"), Some(f64::NEG_INFINITY));
        assert!(parse_float(".nan").is_some_and(f64::is_nan));
        assert_eq!(parse_float("."), None);
        assert_eq!(parse_float("1e"), None);
        assert_eq!(parse_float("1.2.3"), None);
    }

    #[test]
    fn plain_kinds() {
        assert_eq!(plain_kind("1"), ValueKind::Int);
        assert_eq!(plain_kind("1.0"), ValueKind::Float);
        assert_eq!(plain_kind("two"), ValueKind::String);
        assert_eq!(plain_kind("~"), ValueKind::Null);
    }

    #[test]
    fn float_formatting_round_trips() {
        for x in [3.14, 3.0, -0.0, 1e20, 1.5e-7, 0.001, 123456.789, f64::MAX, f64::MIN_POSITIVE] {
            let text = format_float(x);
            assert_eq!(plain_kind(&text), ValueKind::Float, "{text}");
            assert_eq!(parse_float(&text), Some(x), "{text}");
        }
        assert_eq!(format_float(3.0), "3.0");
        assert_eq!(format_float(3.14), "3.14");
        assert_eq!(format_float(f64::INFINITY), ".inf");
        assert_eq!(format_float(f64::NAN), ".nan");
    }
}
