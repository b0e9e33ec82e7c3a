//! Countdown until an exam.

use chrono::{DateTime, FixedOffset};

/// Remaining time until an exam, or the fact that it already started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Countdown {
    Passed,
    Remaining { days: i64, hours: i64, minutes: i64 },
}

/// Splits `exam_date - now` into whole days, hours (0-23) and minutes (0-59).
///
/// Leftover seconds are truncated, never rounded up. An exam starting exactly
/// at `now` is `Remaining` with all fields zero.
pub fn time_left(exam_date: &DateTime<FixedOffset>, now: &DateTime<FixedOffset>) -> Countdown {
    let remaining = exam_date.signed_duration_since(*now);
    if remaining < chrono::Duration::zero() {
        return Countdown::Passed;
    }

    let total_hours = remaining.num_hours();
    Countdown::Remaining {
        days: total_hours / 24,
        hours: total_hours % 24,
        minutes: remaining.num_minutes() % 60,
    }
}
