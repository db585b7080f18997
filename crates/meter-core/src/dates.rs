//! Date normalization for spreadsheet cells.
//!
//! Meter sheets arrive with dates as native spreadsheet dates, as day-count
//! serials, or as locale-formatted text. [`normalize_date`] turns any of
//! those into a [`NaiveDate`]; `None` tells the caller to skip the row.

use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta};
use regex::Regex;

use crate::models::CellValue;

/// Serial number of 1970-01-01 in the spreadsheet day count.
pub const UNIX_EPOCH_SERIAL: f64 = 25569.0;

/// Days subtracted from small serials anchored at 1900-01-01: one for the
/// 1-based count and one for the phantom 1900-02-29.
const EPOCH_1900_CORRECTION: f64 = 2.0;

/// Generic date-time layouts tried against every fallback candidate.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Generic date-only layouts. Day-first where the order is ambiguous.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d-%m-%Y",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d %Y",
    "%B %d %Y",
    "%b %d, %Y",
    "%B %d, %Y",
];

/// Normalize a cell into a calendar date.
///
/// Rules, in order:
/// 1. native dates are returned unchanged;
/// 2. numbers are spreadsheet serials (see [`from_serial`]);
/// 3. text matching `DD/MM/YYYY` is read day-first, never swapped;
/// 4. otherwise a list of text rewrites is run through [`parse_generic`].
pub fn normalize_date(cell: &CellValue) -> Option<NaiveDate> {
    match cell {
        CellValue::Empty => None,
        CellValue::Date(d) => Some(*d),
        CellValue::Number(n) => from_serial(*n),
        CellValue::Text(s) => parse_date_str(s),
    }
}

/// Convert a spreadsheet day-count serial into a date.
///
/// Serials above [`UNIX_EPOCH_SERIAL`] are anchored at the Unix epoch;
/// smaller ones are anchored at 1900-01-01 minus two days. Fractional days
/// (a time of day) are dropped. `0` and non-finite values yield `None`.
pub fn from_serial(value: f64) -> Option<NaiveDate> {
    if !value.is_finite() || value == 0.0 {
        return None;
    }

    let (anchor, offset) = if value > UNIX_EPOCH_SERIAL {
        (
            NaiveDate::from_ymd_opt(1970, 1, 1)?,
            value - UNIX_EPOCH_SERIAL,
        )
    } else {
        (
            NaiveDate::from_ymd_opt(1900, 1, 1)?,
            value - EPOCH_1900_CORRECTION,
        )
    };

    let days = offset.floor();
    if days.abs() > i32::MAX as f64 {
        return None;
    }
    anchor.checked_add_signed(TimeDelta::try_days(days as i64)?)
}

/// Parse a text cell. See [`normalize_date`] for the rule order.
pub fn parse_date_str(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Some(date) = parse_day_month_year(s) {
        return Some(date);
    }

    let candidates = [
        s.to_string(),
        s.replace('/', "-"),
        s.replace('.', "-"),
        reverse_tokens(s, '/'),
        reverse_tokens(s, '.'),
    ];

    candidates.iter().find_map(|c| parse_generic(c))
}

/// Strict `DD/MM/YYYY` (1–2 digit day and month), found anywhere in the
/// text so that prefixes like a weekday (`"Seg, 03/04/2024"`) or a trailing
/// time are tolerated.
///
/// Returns `None` when the pattern does not match or the captured numbers
/// do not form a real date (e.g. `31/02/2024`).
fn parse_day_month_year(s: &str) -> Option<NaiveDate> {
    static DMY: OnceLock<Regex> = OnceLock::new();
    let re = DMY.get_or_init(|| {
        Regex::new(r"(\d{1,2})/(\d{1,2})/(\d{4})\b").expect("regex is valid")
    });
    let caps = re.captures(s)?;
    let day: u32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let year: i32 = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Split on `sep`, reverse the tokens and join them with `-`.
fn reverse_tokens(s: &str, sep: char) -> String {
    let mut parts: Vec<&str> = s.split(sep).collect();
    parts.reverse();
    parts.join("-")
}

/// Generic date parser used for the fallback candidates.
///
/// Accepts RFC 3339, ISO date-times, and the layouts in [`DATE_FORMATS`].
pub fn parse_generic(s: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.date());
        }
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}
