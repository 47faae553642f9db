/// Date handling for photo metadata
///
/// Every stored timestamp is RFC 3339 UTC with second precision
/// (`2024-03-05T14:30:00Z`).
use crate::error::{JournalError, JournalResult};
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

/// Local date-time forms accepted from clients, read as UTC
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Stored form of a timestamp
pub fn format_timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Resolve a client-supplied date taken
///
/// Blank or absent values fall back to `now`. Anything present but
/// unparseable is rejected rather than guessed at.
pub fn resolve_date_taken(raw: Option<&str>, now: DateTime<Utc>) -> JournalResult<DateTime<Utc>> {
    let raw = match raw.map(str::trim) {
        Some(raw) if !raw.is_empty() => raw,
        _ => return Ok(now),
    };

    parse_date_taken(raw)
        .ok_or_else(|| JournalError::InvalidInput(format!("Invalid dateTaken: {}", raw)))
}

fn parse_date_taken(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Parse a `YYYY-MM-DD` gallery filter
pub fn parse_filter_date(raw: &str) -> JournalResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        JournalError::InvalidInput(format!("Invalid date filter (expected YYYY-MM-DD): {}", raw))
    })
}
