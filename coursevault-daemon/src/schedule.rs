//! Daily trigger time computation.

use chrono::{DateTime, Days, Duration, NaiveTime, TimeZone};

/// The first occurrence of wall-clock `at` strictly after `now`, in `now`'s zone.
///
/// A time skipped by a DST jump moves to the next day that has it; an
/// ambiguous time resolves to its earlier instant.
pub fn next_run_after<Tz: TimeZone>(now: &DateTime<Tz>, at: NaiveTime) -> DateTime<Tz> {
    let tz = now.timezone();
    for offset in 0..3 {
        let Some(date) = now.date_naive().checked_add_days(Days::new(offset)) else {
            break;
        };
        if let Some(when) = tz.from_local_datetime(&date.and_time(at)).earliest() {
            if when > *now {
                return when;
            }
        }
    }
    now.clone() + Duration::days(1)
}

/// How long to sleep from `now` until `next`; zero if already due.
pub fn until(now: &DateTime<impl TimeZone>, next: &DateTime<impl TimeZone>) -> std::time::Duration {
    next.clone()
        .signed_duration_since(now.clone())
        .to_std()
        .unwrap_or(std::time::Duration::ZERO)
}
