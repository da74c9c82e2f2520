//! Remote timestamp parsing.
//!
//! Canvas reports ISO-8601 strings (`2026-02-15T23:59:00Z`), but offsets and
//! fractional seconds drift between endpoints. Everything that compares
//! timestamps goes through [`normalize`] so the comparison is temporal.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};

/// Parse an ISO-8601 / RFC 3339 timestamp, keeping its offset.
///
/// Naive timestamps (no offset) are taken as UTC.
pub fn parse(value: &str) -> Option<DateTime<FixedOffset>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt);
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(Utc.from_utc_datetime(&naive).fixed_offset());
        }
    }
    None
}

/// Parse and convert to UTC. `None` for absent or unparseable input.
pub fn normalize(value: &str) -> Option<DateTime<Utc>> {
    parse(value).map(|dt| dt.with_timezone(&Utc))
}
