//! Field parsers for the incident table.
//!
//! Dates show up in a handful of layouts depending on which tool exported
//! the file, so [`parse_date`] tries each known layout in turn.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d-%m-%Y"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Parses a calendar date, discarding any time-of-day component.
#[must_use]
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(date);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive())
}

/// Parses a non-negative whole number. Accepts float spellings such as
/// `"34.0"` that spreadsheet exports produce.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn parse_age(s: &str) -> Option<u32> {
    let s = s.trim();
    if let Ok(v) = s.parse::<u32>() {
        return Some(v);
    }
    let v = s.parse::<f64>().ok()?;
    if v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v <= f64::from(u32::MAX) {
        Some(v as u32)
    } else {
        None
    }
}

/// Parses a finite floating point number.
#[must_use]
pub fn parse_f64(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_iso_date() {
        assert_eq!(parse_date("2023-01-15"), Some(ymd(2023, 1, 15)));
    }

    #[test]
    fn parses_us_style_date() {
        assert_eq!(parse_date("01/15/2023"), Some(ymd(2023, 1, 15)));
    }

    #[test]
    fn parses_datetime_and_drops_time() {
        assert_eq!(parse_date("2023-01-15 22:10:00"), Some(ymd(2023, 1, 15)));
        assert_eq!(parse_date("2023-01-15T22:10:00.000"), Some(ymd(2023, 1, 15)));
        assert_eq!(
            parse_date("2023-01-15T22:10:00+05:30"),
            Some(ymd(2023, 1, 15))
        );
    }

    #[test]
    fn rejects_garbage_dates() {
        assert!(parse_date("").is_none());
        assert!(parse_date("yesterday").is_none());
        assert!(parse_date("2023-13-40").is_none());
    }

    #[test]
    fn parses_ages() {
        assert_eq!(parse_age("34"), Some(34));
        assert_eq!(parse_age(" 34.0 "), Some(34));
        assert!(parse_age("34.5").is_none());
        assert!(parse_age("-1").is_none());
        assert!(parse_age("unknown").is_none());
    }

    #[test]
    fn rejects_non_finite_floats() {
        assert!(parse_f64("NaN").is_none());
        assert!(parse_f64("inf").is_none());
        assert_eq!(parse_f64("13.05"), Some(13.05));
    }
}
