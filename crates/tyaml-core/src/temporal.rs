//! # Temporal Types — `!!timestamp` Text Forms
//!
//! Parsing and rendering of the text carried by `!!timestamp` scalars.
//!
//! ## Accepted Forms
//!
//! - RFC 3339: `2019-10-06T07:15:00-07:00`, `2019-10-06T14:15:00.5Z`
//! - Lower-case separator: `2019-10-06t07:15:00-07:00`
//! - Space separator: `2001-12-14 21:59:43.10 -05:00`, `2001-12-14 21:59:43.10 Z`
//! - No offset (interpreted as UTC): `2001-12-15 2:59:43.10`
//! - Date only (UTC midnight): `2002-12-14`
//!
//! Anything else, including impossible calendar values such as month 13,
//! is rejected. There is no clamping.
//!
//! ## Rendering
//!
//! Timestamps render as RFC 3339 with the minimal number of fractional
//! digits and the original offset (`Z` for UTC), so a decode of the
//! rendered text yields the same instant and offset. RFC 3339 offsets have
//! minute precision; a timestamp whose offset has a seconds part renders
//! in UTC instead, which keeps the instant.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone};

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dt%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f %:z",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dt%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
];

/// Parse `!!timestamp` text. Returns `None` for anything that is not a
/// valid calendar instant in one of the accepted forms.
pub fn parse_timestamp(text: &str) -> Option<DateTime<FixedOffset>> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt);
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(text, fmt) {
            return Some(dt);
        }
    }
    // A trailing `Z` after a space separator is not covered by `%:z`.
    let (naive_text, utc_suffix) = match text.strip_suffix('Z').or_else(|| text.strip_suffix('z')) {
        Some(rest) => (rest.trim_end(), true),
        None => (text, false),
    };
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(naive_text, fmt) {
            return utc(&naive);
        }
    }
    if !utc_suffix {
        if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
            return date.and_hms_opt(0, 0, 0).and_then(|naive| utc(&naive));
        }
    }
    None
}

/// Render a timestamp as RFC 3339 text.
pub fn format_timestamp(ts: &DateTime<FixedOffset>) -> String {
    if ts.offset().local_minus_utc() % 60 != 0 {
        return ts.naive_utc().and_utc().to_rfc3339_opts(SecondsFormat::AutoSi, true);
    }
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn utc(naive: &NaiveDateTime) -> Option<DateTime<FixedOffset>> {
    FixedOffset::east_opt(0).map(|zero| zero.from_utc_datetime(naive))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_rfc3339_with_offset() {
        let ts = parse_timestamp("2019-10-06T07:15:00-07:00").unwrap();
        assert_eq!(ts.offset().local_minus_utc(), -7 * 3600);
        assert_eq!(ts.hour(), 7);
        assert_eq!(ts.minute(), 15);
    }

    #[test]
    fn test_parse_lowercase_separator() {
        let a = parse_timestamp("2001-12-14t21:59:43.10-05:00").unwrap();
        let b = parse_timestamp("2001-12-14T21:59:43.10-05:00").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_parse_space_separated_with_offset() {
        let ts = parse_timestamp("2001-12-14 21:59:43.10 -05:00").unwrap();
        assert_eq!(ts.offset().local_minus_utc(), -5 * 3600);
        assert_eq!(ts.nanosecond(), 100_000_000);
    }

    #[test]
    fn test_parse_space_separated_zulu() {
        let ts = parse_timestamp("2001-12-14 21:59:43.10 Z").unwrap();
        assert_eq!(ts.offset().local_minus_utc(), 0);
        assert_eq!(ts.hour(), 21);
    }

    #[test]
    fn test_parse_naive_is_utc() {
        let ts = parse_timestamp("2001-12-15 2:59:43.10").unwrap();
        assert_eq!(ts.offset().local_minus_utc(), 0);
        assert_eq!(ts.hour(), 2);
    }

    #[test]
    fn test_parse_date_only_is_utc_midnight() {
        let ts = parse_timestamp("2002-12-14").unwrap();
        assert_eq!((ts.year(), ts.month(), ts.day()), (2002, 12, 14));
        assert_eq!((ts.hour(), ts.minute(), ts.second()), (0, 0, 0));
    }

    #[test]
    fn test_month_13_rejected() {
        assert!(parse_timestamp("2019-13-06T07:15:00-07:00").is_none());
        assert!(parse_timestamp("2019-13-06").is_none());
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn test_format_keeps_offset() {
        let ts = parse_timestamp("2019-10-06T07:15:00-07:00").unwrap();
        assert_eq!(format_timestamp(&ts), "2019-10-06T07:15:00-07:00");
    }

    #[test]
    fn test_format_utc_uses_z() {
        let ts = parse_timestamp("2002-12-14").unwrap();
        assert_eq!(format_timestamp(&ts), "2002-12-14T00:00:00Z");
    }

    #[test]
    fn test_format_offset_with_seconds_renders_utc() {
        let offset = FixedOffset::east_opt(3601).unwrap();
        let ts = offset.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let text = format_timestamp(&ts);
        assert_eq!(text, "2019-12-31T22:59:59Z");
        assert_eq!(parse_timestamp(&text), Some(ts));

        let west = FixedOffset::west_opt(59).unwrap();
        let ts = west.with_ymd_and_hms(2020, 6, 1, 12, 0, 0).unwrap();
        assert_eq!(parse_timestamp(&format_timestamp(&ts)), Some(ts));
    }

    #[test]
    fn test_format_then_parse_preserves_instant() {
        let ts = parse_timestamp("2001-12-14 21:59:43.123456789 +02:00").unwrap();
        let text = format_timestamp(&ts);
        assert_eq!(parse_timestamp(&text), Some(ts));
    }
}
