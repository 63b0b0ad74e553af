//! Timestamp parsing that keeps the calendar date the record was authored with.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

// `%z` takes `+hhmm` as well as `+hh:mm`.
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%z",
];

/// Parse a treatment timestamp into the wall-clock time it was recorded in.
///
/// Accepts:
/// - RFC3339 with offset -> local time of that offset (no UTC conversion)
/// - offsets without a colon (`+0000`, `-0530`), `T` or space separated
/// - Naive datetime `YYYY-MM-DDTHH:MM[:SS[.fff]]` or with a space separator
/// - `YYYY-MM-DD` -> midnight
pub fn parse_treatment_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.naive_local());
        }
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(ndt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Calendar date of a treatment timestamp, or `None` when it cannot be parsed.
pub fn treatment_date_of(s: &str) -> Option<NaiveDate> {
    parse_treatment_timestamp(s).map(|dt| dt.date())
}
