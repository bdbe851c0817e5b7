//! Canonical date and time-of-day strings.
//!
//! Dates are local wall-clock calendar dates rendered as `YYYY-MM-DD`; times
//! are 24-hour `HH:MM`. Both forms are fixed-width and zero-padded, so plain
//! string comparison orders them correctly.

use std::sync::LazyLock;

use chrono::{Local, NaiveDate};
use regex::Regex;

static DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{4})-([0-9]{2})-([0-9]{2})$").expect("valid date regex"));

static TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{2}):([0-9]{2})$").expect("valid time regex"));

/// Format a calendar date as `YYYY-MM-DD`.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Today's date in the local timezone.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Parse a `YYYY-MM-DD` string into a real calendar date.
///
/// Returns `None` for anything that is not exactly that shape, for months
/// outside 1-12 and days outside 1-31, and for dates that would roll over
/// into the next month (`2025-02-30`).
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let caps = DATE_RE.captures(s)?;

    let year: i32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let day: u32 = caps[3].parse().ok()?;

    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return None;
    }

    // from_ymd_opt refuses rolled-over dates instead of normalizing them
    NaiveDate::from_ymd_opt(year, month, day)
}

pub fn is_valid_date(s: &str) -> bool {
    parse_date(s).is_some()
}

/// Check an `HH:MM` time of day (00:00 - 23:59).
pub fn is_valid_time(s: &str) -> bool {
    let Some(caps) = TIME_RE.captures(s) else {
        return false;
    };

    let hours: u32 = caps[1].parse().unwrap_or(u32::MAX);
    let minutes: u32 = caps[2].parse().unwrap_or(u32::MAX);

    hours <= 23 && minutes <= 59
}

/// Check that `end` is strictly after `start` on the same day.
pub fn is_valid_time_range(start: &str, end: &str) -> bool {
    is_valid_time(start) && is_valid_time(end) && start < end
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn rejects_calendar_invalid_dates() {
        assert!(!is_valid_date("2025-02-30"));
        assert!(!is_valid_date("2025-02-29"));
        assert!(!is_valid_date("2025-13-01"));
        assert!(!is_valid_date("2025-00-10"));
        assert!(!is_valid_date("2025-04-31"));
        assert!(!is_valid_date("2025-01-00"));
        assert!(!is_valid_date("2025-01-32"));
    }

    #[test]
    fn accepts_leap_day_only_in_leap_years() {
        assert!(is_valid_date("2024-02-29"));
        assert!(is_valid_date("2000-02-29"));
        assert!(!is_valid_date("1900-02-29"));
    }

    #[test]
    fn rejects_malformed_date_strings() {
        assert!(parse_date("2025-1-05").is_none());
        assert!(parse_date("25-01-05").is_none());
        assert!(parse_date(" 2025-01-05").is_none());
        assert!(parse_date("2025-01-05T10:00").is_none());
        assert!(parse_date("2025/01/05").is_none());
        assert!(parse_date("").is_none());
        // non-ASCII digits are not accepted
        assert!(parse_date("２０２５-01-05").is_none());
    }

    #[test]
    fn parse_returns_the_same_fields() {
        let date = parse_date("2025-10-24").unwrap();
        assert_eq!((date.year(), date.month(), date.day()), (2025, 10, 24));
    }

    #[test]
    fn format_then_parse_roundtrips() {
        let mut date = NaiveDate::from_ymd_opt(2023, 12, 25).unwrap();
        for _ in 0..800 {
            assert_eq!(parse_date(&format_date(date)), Some(date));
            date = date.succ_opt().unwrap();
        }
    }

    #[test]
    fn format_pads_fields() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
        assert_eq!(format_date(date), "2025-03-07");
    }

    #[test]
    fn every_clock_time_is_valid() {
        for h in 0..24 {
            for m in 0..60 {
                let time = format!("{:02}:{:02}", h, m);
                assert!(is_valid_time(&time), "{time} should be valid");
            }
        }
    }

    #[test]
    fn out_of_range_times_are_invalid() {
        assert!(!is_valid_time("24:00"));
        assert!(!is_valid_time("12:60"));
        assert!(!is_valid_time("9:00"));
        assert!(!is_valid_time("09:00:00"));
        assert!(!is_valid_time("ab:cd"));
    }

    #[test]
    fn time_range_requires_strict_order() {
        assert!(is_valid_time_range("09:00", "17:00"));
        assert!(!is_valid_time_range("17:00", "09:00"));
        assert!(!is_valid_time_range("09:00", "09:00"));
        assert!(!is_valid_time_range("09:00", "24:00"));
    }
}
