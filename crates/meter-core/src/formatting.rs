use chrono::NaiveDate;

/// Format a floating-point number with thousands separators and a fixed number
/// of decimal places.
///
/// # Examples
///
/// ```
/// use meter_core::formatting::format_number;
///
/// assert_eq!(format_number(1234.5,  1), "1,234.5");
/// assert_eq!(format_number(1234567.0, 0), "1,234,567");
/// assert_eq!(format_number(0.0, 2), "0.00");
/// assert_eq!(format_number(-9876.5, 1), "-9,876.5");
/// ```
pub fn format_number(value: f64, decimals: u32) -> String {
    if !value.is_finite() {
        return "-".to_string();
    }

    let rounded = round_to(value.abs(), decimals);
    let negative = value < 0.0 && rounded != 0.0;

    let integer_part = rounded.trunc() as u64;
    let frac_part = rounded - rounded.trunc();
    let grouped = group_thousands(&integer_part.to_string());

    let result = if decimals == 0 {
        grouped
    } else {
        // `frac_str` starts with "0.", e.g. "0.50".
        let frac_str = format!("{:.prec$}", frac_part, prec = decimals as usize);
        format!("{}{}", grouped, &frac_str[1..])
    };

    if negative {
        format!("-{}", result)
    } else {
        result
    }
}

/// Round half away from zero to `decimals` places.
///
/// A tiny epsilon is added before rounding so values such as `1.005` that
/// sit just below the midpoint in binary still round up.
///
/// ```
/// use meter_core::formatting::round_to;
///
/// assert_eq!(round_to(1.005, 2), 1.01);
/// assert_eq!(round_to(-2.345, 2), -2.35);
/// ```
pub fn round_to(value: f64, decimals: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let factor = 10_f64.powi(decimals as i32);
    let abs_value = value.abs();
    let epsilon = f64::EPSILON * abs_value * factor;
    let rounded = ((abs_value * factor) + epsilon).round() / factor;
    rounded.copysign(value)
}

/// Number followed by a unit label, e.g. `"12.50 kWh"`.
pub fn format_quantity(value: f64, decimals: u32, unit: &str) -> String {
    format!("{} {}", format_number(value, decimals), unit)
}

/// Signed one-decimal percentage: `"+12.5%"`, `"-3.0%"`, `"0.0%"`.
pub fn format_variation(variation: f64) -> String {
    let sign = if variation > 0.0 { "+" } else { "" };
    format!("{}{:.1}%", sign, variation)
}

/// Direction of a month-over-month change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendDirection {
    Increase,
    Decrease,
    Stable,
}

impl TrendDirection {
    pub fn of(variation: f64) -> Self {
        if variation > 0.0 {
            TrendDirection::Increase
        } else if variation < 0.0 {
            TrendDirection::Decrease
        } else {
            TrendDirection::Stable
        }
    }

    /// Arrow used in the text report.
    pub fn arrow(self) -> &'static str {
        match self {
            TrendDirection::Increase => "↑",
            TrendDirection::Decrease => "↓",
            TrendDirection::Stable => "→",
        }
    }
}

/// Brazilian day-first date, `DD/MM/YYYY`.
pub fn format_date_br(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Insert commas every three digits from the right of an integer string.
fn group_thousands(s: &str) -> String {
    if s.len() <= 3 {
        return s.to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    let remainder = chars.len() % 3;
    for (i, &c) in chars.iter().enumerate() {
        if i != 0 && (i % 3 == remainder) {
            result.push(',');
        }
        result.push(c);
    }
    result
}

// ── Tests ──────────────────────────────────────────────────────────────────────
