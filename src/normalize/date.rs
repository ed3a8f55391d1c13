//! Calendar date normalization to ISO-8601 `YYYY-MM-DD`.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use super::{collapse_whitespace, Normalized};
use crate::source::RawValue;

/// Date-only formats, tried in order.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%Y/%m/%d",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%b %d %Y",
    "%B %d %Y",
];

/// Timestamp formats without an offset.
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"];

/// Normalize a date. Unrecognized text is passed through unchanged.
pub fn normalize_date(raw: &RawValue) -> Normalized {
    let text = collapse_whitespace(&raw.to_text());
    match parse_date(&text) {
        Some(date) => Normalized::parsed(date.format("%Y-%m-%d").to_string()),
        None => Normalized::unparsed(text),
    }
}

/// Parse any supported date or timestamp form.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.date_naive());
    }

    for format in DATETIME_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(text, format) {
            return Some(ts.date());
        }
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::Quality;

    fn norm(s: &str) -> Normalized {
        normalize_date(&RawValue::from(s))
    }

    #[test]
    fn test_iso_date() {
        assert_eq!(norm("2004-09-22"), Normalized::parsed("2004-09-22"));
    }

    #[test]
    fn test_us_date() {
        assert_eq!(norm("09/22/2004").value, "2004-09-22");
    }

    #[test]
    fn test_free_text_dates() {
        assert_eq!(norm("22 Sep 2004").value, "2004-09-22");
        assert_eq!(norm("September 22, 2004").value, "2004-09-22");
        assert_eq!(norm("Sep 22, 2004").value, "2004-09-22");
    }

    #[test]
    fn test_timestamps() {
        assert_eq!(norm("2004-09-22T20:00:00-04:00").value, "2004-09-22");
        assert_eq!(norm("2004-09-22T20:00:00Z").value, "2004-09-22");
        assert_eq!(norm("2004-09-22 20:00:00").value, "2004-09-22");
    }

    #[test]
    fn test_unparsed_passthrough() {
        let n = norm("  Fall   2004 ");
        assert_eq!(n.value, "Fall 2004");
        assert_eq!(n.quality, Quality::Unparsed);
    }

    #[test]
    fn test_invalid_calendar_date_is_unparsed() {
        assert_eq!(norm("2004-02-31").quality, Quality::Unparsed);
    }
}
