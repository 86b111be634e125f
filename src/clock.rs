//! Day-granularity date helpers for watering schedules.
//!
//! All comparisons are calendar-day based (UTC): a plant due at any time
//! today is "due today" no matter the hour, so differences are computed by
//! calendar-date subtraction rather than sub-day duration math.

use chrono::{DateTime, Duration, Utc};

/// Add a signed number of whole days to a timestamp.
pub fn add_days(ts: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    ts + Duration::days(days)
}

/// Strict instant ordering: `a` is before `b`.
pub fn is_before(a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
    a < b
}

/// Whether `ts` falls on the same UTC calendar date as `now`.
pub fn is_today(ts: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    ts.date_naive() == now.date_naive()
}

/// Signed whole-day difference `later - earlier` by calendar date.
///
/// Partial days never count: 23:59 tonight minus 00:01 this morning is 0
/// days, and 00:01 tomorrow minus 23:59 tonight is 1 day.
pub fn days_between(later: DateTime<Utc>, earlier: DateTime<Utc>) -> i64 {
    (later.date_naive() - earlier.date_naive()).num_days()
}
