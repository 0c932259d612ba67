//! Shared timestamp and calendar helpers.

use chrono::{Days, NaiveDate, Utc, Weekday};
use ulid::Ulid;

/// Returns the current UTC instant as an RFC 3339 string.
///
/// Stored timestamps all use this format, so lexicographic comparison in SQL
/// matches chronological order.
pub fn now_iso() -> String {
    Utc::now().to_rfc3339()
}

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

pub fn new_event_id() -> String {
    Ulid::new().to_string()
}

/// Parses a `YYYY-MM-DD` date as used for chore due dates.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Monday of the ISO week containing `date`.
pub fn iso_week_start(date: NaiveDate) -> NaiveDate {
    date.week(Weekday::Mon).first_day()
}

/// Monday 00:00:00 UTC of the current ISO week, as an RFC 3339 string.
///
/// Weekly redemption limits reset on this fixed calendar boundary, not on a
/// rolling 7-day window.
pub fn current_week_start_iso() -> String {
    let monday = iso_week_start(today());
    monday
        .and_hms_opt(0, 0, 0)
        .unwrap()
        .and_utc()
        .to_rfc3339()
}

pub fn add_days(date: NaiveDate, days: u64) -> NaiveDate {
    date.checked_add_days(Days::new(days)).unwrap_or(date)
}
