//! Best-effort parsing of feed date strings into epoch milliseconds.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Parses a date string into epoch milliseconds, trying the formats feeds
/// and job options actually contain: RFC 3339, RFC 2822, the JavaScript
/// `Date#toString` rendering, and bare ISO date/datetime shapes.
///
/// Returns `None` when no format matches. Callers decide whether that is an
/// error (a job anchor) or a zero default (an entry's `datenum`).
pub fn parse_epoch_ms(value: &str) -> Option<i64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.timestamp_millis());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
        return Some(dt.timestamp_millis());
    }

    // JS Date#toString, e.g. "Tue Nov 26 2013 02:11:59 GMT+0100 (CET)";
    // the trailing zone name in parentheses is noise
    let without_zone_name = match trimmed.find(" (") {
        Some(idx) => trimmed[..idx].trim_end(),
        None => trimmed,
    };
    if let Ok(dt) = DateTime::parse_from_str(without_zone_name, "%a %b %d %Y %H:%M:%S GMT%z") {
        return Some(dt.timestamp_millis());
    }

    if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.and_utc().timestamp_millis());
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis());
    }

    None
}
