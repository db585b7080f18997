//! Numeric interpretation of spreadsheet cells.
//!
//! Zero is the "not measured" sentinel of the meter sheets: a daily delta of
//! `0` means the reading was missing, not that nothing was consumed. All
//! statistics go through [`is_measured`] so the convention lives in one place.

use std::sync::OnceLock;

use regex::Regex;

use crate::models::CellValue;

/// `true` when `value` is a real measurement: finite and not exactly zero.
pub fn is_measured(value: f64) -> bool {
    value.is_finite() && value != 0.0
}

/// Interpret a cell as a number.
///
/// * `Number` cells are returned when finite.
/// * `Text` cells are trimmed and parsed as a float; failing that, a
///   decimal-comma value (`"12,5"`) is accepted when the text has no `.`;
///   failing that, the longest leading numeric prefix is used (`"12 kWh"`).
/// * Empty and date cells are not numbers.
pub fn parse_number(cell: &CellValue) -> Option<f64> {
    match cell {
        CellValue::Number(n) if n.is_finite() => Some(*n),
        CellValue::Text(s) => parse_number_str(s),
        _ => None,
    }
}

/// String form of [`parse_number`].
pub fn parse_number_str(s: &str) -> Option<f64> {
    parse_strict_str(s).or_else(|| leading_number(s.trim()))
}

/// Like [`parse_number`], but text must be a whole number: a float or a
/// decimal-comma value. `"12 kWh"` is not a number here.
pub fn parse_number_strict(cell: &CellValue) -> Option<f64> {
    match cell {
        CellValue::Number(n) if n.is_finite() => Some(*n),
        CellValue::Text(s) => parse_strict_str(s),
        _ => None,
    }
}

fn parse_strict_str(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(v) = trimmed.parse::<f64>() {
        return v.is_finite().then_some(v);
    }

    if trimmed.contains(',') && !trimmed.contains('.') {
        if let Ok(v) = trimmed.replace(',', ".").parse::<f64>() {
            return v.is_finite().then_some(v);
        }
    }

    None
}

/// Parse the longest numeric prefix of `s`, if it has one.
fn leading_number(s: &str) -> Option<f64> {
    static PREFIX: OnceLock<Regex> = OnceLock::new();
    let re = PREFIX.get_or_init(|| {
        Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?").expect("regex is valid")
    });
    let m = re.find(s)?;
    m.as_str().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_measured() {
        assert!(is_measured(0.5));
        assert!(is_measured(-3.0));
        assert!(!is_measured(0.0));
        assert!(!is_measured(-0.0));
        assert!(!is_measured(f64::NAN));
        assert!(!is_measured(f64::INFINITY));
    }

    #[test]
    fn test_parse_number_cells() {
        assert_eq!(parse_number(&CellValue::Number(4.25)), Some(4.25));
        assert_eq!(parse_number(&CellValue::Number(f64::NAN)), None);
        assert_eq!(parse_number(&CellValue::Empty), None);
        assert_eq!(parse_number(&CellValue::text("")), None);
        assert_eq!(parse_number(&CellValue::text(" 12.5 ")), Some(12.5));
    }

    #[test]
    fn test_parse_number_decimal_comma() {
        assert_eq!(parse_number_str("12,5"), Some(12.5));
        assert_eq!(parse_number_str("-0,75"), Some(-0.75));
    }

    #[test]
    fn test_parse_number_leading_prefix() {
        assert_eq!(parse_number_str("12 kWh"), Some(12.0));
        assert_eq!(parse_number_str("3.5m³"), Some(3.5));
        // Same as a plain float parser stopping at the comma.
        assert_eq!(parse_number_str("1.234,56"), Some(1.234));
    }

    #[test]
    fn test_parse_number_strict_has_no_prefix_rule() {
        assert_eq!(parse_number_strict(&CellValue::text("12 kWh")), None);
        assert_eq!(parse_number_strict(&CellValue::text(" 12,5 ")), Some(12.5));
        assert_eq!(parse_number_strict(&CellValue::text("7")), Some(7.0));
        assert_eq!(parse_number_strict(&CellValue::Number(f64::INFINITY)), None);
    }

    #[test]
    fn test_parse_number_rejects_text() {
        assert_eq!(parse_number_str("abc"), None);
        assert_eq!(parse_number_str("Medicao"), None);
        assert_eq!(parse_number_str("inf"), None);
        assert_eq!(parse_number_str("NaN"), None);
    }
}
