//! Human-readable date strings for artifact bodies and the task list.
//!
//! Times are shown in the offset the remote reported them in. Unparseable
//! input is shown verbatim rather than dropped.

use chrono::{DateTime, FixedOffset, Timelike};

use coursevault_core::timestamp;

pub const NO_DUE_DATE: &str = "No due date";
pub const TIME_NOT_SPECIFIED: &str = "Time not specified";

const DATE_TIME_FMT: &str = "%B %d, %Y at %I:%M %p";
const DATE_FMT: &str = "%B %d, %Y";
const CLOCK_FMT: &str = "%I:%M %p";

/// `February 15, 2026 at 11:59 PM`, [`NO_DUE_DATE`] when absent, or the raw
/// value when it cannot be parsed.
pub fn format_due_date(due_at: Option<&str>) -> String {
    match due_at.map(str::trim).filter(|s| !s.is_empty()) {
        None => NO_DUE_DATE.to_string(),
        Some(raw) => match timestamp::parse(raw) {
            Some(dt) => dt.format(DATE_TIME_FMT).to_string(),
            None => raw.to_string(),
        },
    }
}

fn is_midnight(dt: &DateTime<FixedOffset>) -> bool {
    dt.hour() == 0 && dt.minute() == 0 && dt.second() == 0
}

/// True when the start falls exactly on midnight in its own offset.
pub fn is_all_day(start_at: Option<&str>) -> bool {
    start_at
        .and_then(timestamp::parse)
        .is_some_and(|dt| is_midnight(&dt))
}

/// Display form of an event's time span.
///
/// - no start: [`TIME_NOT_SPECIFIED`]
/// - midnight start: `March 01, 2026 (All Day)`
/// - start and end: `March 02, 2026 from 10:00 AM to 11:30 AM`
/// - start only: `March 02, 2026 at 10:00 AM`
pub fn format_event_time(start_at: Option<&str>, end_at: Option<&str>) -> String {
    let Some(raw_start) = start_at.map(str::trim).filter(|s| !s.is_empty()) else {
        return TIME_NOT_SPECIFIED.to_string();
    };
    let Some(start) = timestamp::parse(raw_start) else {
        return raw_start.to_string();
    };
    if is_midnight(&start) {
        return format!("{} (All Day)", start.format(DATE_FMT));
    }
    match end_at.map(str::trim).filter(|s| !s.is_empty()) {
        None => start.format(DATE_TIME_FMT).to_string(),
        Some(raw_end) => match timestamp::parse(raw_end) {
            Some(end) => format!(
                "{} from {} to {}",
                start.format(DATE_FMT),
                start.format(CLOCK_FMT),
                end.format(CLOCK_FMT)
            ),
            None => raw_start.to_string(),
        },
    }
}

/// Short due label for the task list: `Feb 15, 2026 11:59 PM`.
pub fn format_task_due(due_at: Option<&str>) -> String {
    match due_at.map(str::trim).filter(|s| !s.is_empty()) {
        None => NO_DUE_DATE.to_string(),
        Some(raw) => timestamp::parse(raw)
            .map(|dt| dt.format("%b %d, %Y %I:%M %p").to_string())
            .unwrap_or_else(|| raw.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn due_date_formats() {
        assert_eq!(
            format_due_date(Some("2026-02-15T23:59:00Z")),
            "February 15, 2026 at 11:59 PM"
        );
        assert_eq!(format_due_date(None), NO_DUE_DATE);
        assert_eq!(format_due_date(Some("")), NO_DUE_DATE);
        assert_eq!(format_due_date(Some("soon-ish")), "soon-ish");
    }

    #[test]
    fn all_day_uses_own_offset() {
        assert!(is_all_day(Some("2026-03-01T00:00:00-06:00")));
        assert!(!is_all_day(Some("2026-03-01T06:00:00Z")));
        assert!(!is_all_day(None));
        assert!(!is_all_day(Some("garbage")));
    }

    #[test]
    fn event_time_variants() {
        assert_eq!(format_event_time(None, None), TIME_NOT_SPECIFIED);
        assert_eq!(
            format_event_time(Some("2026-03-01T00:00:00Z"), None),
            "March 01, 2026 (All Day)"
        );
        assert_eq!(
            format_event_time(Some("2026-03-02T10:00:00Z"), Some("2026-03-02T11:30:00Z")),
            "March 02, 2026 from 10:00 AM to 11:30 AM"
        );
        assert_eq!(
            format_event_time(Some("2026-03-02T10:00:00Z"), None),
            "March 02, 2026 at 10:00 AM"
        );
        assert_eq!(format_event_time(Some("tbd"), None), "tbd");
    }

    #[test]
    fn task_due_is_short() {
        assert_eq!(format_task_due(Some("2026-02-15T23:59:00Z")), "Feb 15, 2026 11:59 PM");
        assert_eq!(format_task_due(None), NO_DUE_DATE);
    }
}
