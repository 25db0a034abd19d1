//! Timestamp coercion for incoming batch values.
//!
//! Export tools are inconsistent about date rendering, so coercion tries a
//! fixed ladder of formats. Failure is not an error: per-cell coercion
//! failures are swallowed by the engine and the prior value is retained.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Display format applied to coerced timestamp cells.
///
/// Spreadsheet number-format syntax, matching the master workbook's
/// existing date columns.
pub const DATE_DISPLAY_FORMAT: &str = "m/d/yyyy h:mm:ss AM/PM";

/// Datetime formats tried after RFC3339, in order.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
];

/// Date-only formats tried last (midnight local time).
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%d.%m.%Y"];

/// Coerce a raw incoming string to a UTC timestamp.
///
/// Naive datetimes are interpreted in local time, matching how the export
/// files are produced. Returns `None` when no format matches; callers
/// treat that as "leave the prior cell value in place".
#[must_use]
pub fn coerce_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return local_to_utc(naive);
        }
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return local_to_utc(date.and_hms_opt(0, 0, 0)?);
        }
    }

    None
}

fn local_to_utc(naive: NaiveDateTime) -> Option<DateTime<Utc>> {
    Local
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}
