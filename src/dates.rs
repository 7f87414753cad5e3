// Date Classifier - loosely formatted date strings → year / year-month buckets
// Best-effort: a handful of common layouts, then a 4-digit-year regex fallback.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

/// Bucket label for anything that cannot be classified
pub const UNKNOWN: &str = "Unknown";

/// Date-time layouts tried in order
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Date-only layouts tried in order
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%b %d %Y",
    "%B %d %Y",
];

/// First run of exactly four digits, not part of a longer digit run
static YEAR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[^0-9])([0-9]{4})(?:[^0-9]|$)").expect("year pattern is valid")
});

/// `YYYY-MM` with nothing else
static YEAR_MONTH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([0-9]{4})-([0-9]{2})$").expect("year-month pattern is valid")
});

/// Try to read a calendar instant out of `date`.
///
/// Accepts RFC 3339 / RFC 2822, ISO date and date-time layouts, US
/// `MM/DD/YYYY`, spelled-out month names, and bare `YYYY-MM` / `YYYY`
/// (both pinned to the first day of the period).
pub fn parse_date(date: &str) -> Option<NaiveDateTime> {
    let date = date.trim();
    if date.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(date) {
        return Some(dt.naive_local());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(date) {
        return Some(dt.naive_local());
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(date, format) {
            return Some(dt);
        }
    }

    for format in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(date, format) {
            return d.and_hms_opt(0, 0, 0);
        }
    }

    if let Some(caps) = YEAR_MONTH_RE.captures(date) {
        let year: i32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, 1)?.and_hms_opt(0, 0, 0);
    }

    if date.len() == 4 && date.chars().all(|c| c.is_ascii_digit()) {
        let year: i32 = date.parse().ok()?;
        return NaiveDate::from_ymd_opt(year, 1, 1)?.and_hms_opt(0, 0, 0);
    }

    None
}

/// Four-digit year of `date`, or [`UNKNOWN`].
///
/// Falls back to the first standalone 4-digit run when the string does not
/// parse as a date ("Q1 2024 draw" → "2024").
pub fn year_of(date: &str) -> String {
    if let Some(dt) = parse_date(date) {
        return format!("{:04}", dt.year());
    }

    YEAR_RE
        .captures(date)
        .map(|caps| caps[1].to_string())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// `YYYY-MM` bucket of `date`, or [`UNKNOWN`]. No regex fallback.
pub fn year_month_of(date: &str) -> String {
    match parse_date(date) {
        Some(dt) => format!("{:04}-{:02}", dt.year(), dt.month()),
        None => UNKNOWN.to_string(),
    }
}
