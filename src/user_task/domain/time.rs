//! Pure time arithmetic used by lifecycle rules.

use chrono::{DateTime, Duration, Utc};

/// Seconds in one hour.
pub const SECONDS_PER_HOUR: i64 = 3600;

/// Hours used as the review window when a task sets no review period.
///
/// Equals `i32::MAX / 3600`, which keeps the deadline representable as a
/// 32-bit epoch offset.
pub const UNLIMITED_REVIEW_HOURS: u64 = 596_523;

/// Returns the whole days elapsed from `earlier` to `later`.
///
/// Partial days are truncated toward zero, so 6 days 23 hours counts as 6.
/// A `later` before `earlier` yields a negative count.
#[must_use]
pub fn days_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> i64 {
    later.signed_duration_since(earlier).num_days()
}

/// Returns `true` when enough whole days separate two receives.
#[must_use]
pub fn cooldown_elapsed(previous: DateTime<Utc>, candidate: DateTime<Utc>, recycle_days: u32) -> bool {
    days_between(previous, candidate) >= i64::from(recycle_days)
}

/// Converts a number of hours into a duration, saturating at the largest
/// representable duration.
#[must_use]
pub fn hours_to_duration(hours: u64) -> Duration {
    i64::try_from(hours)
        .ok()
        .and_then(|h| h.checked_mul(SECONDS_PER_HOUR))
        .and_then(Duration::try_seconds)
        .unwrap_or(Duration::MAX)
}

/// Returns the review window for a task.
///
/// `review_period` is in seconds. `None` or zero falls back to
/// `unlimited_hours`.
#[must_use]
pub fn review_window(review_period: Option<u64>, unlimited_hours: u64) -> Duration {
    match review_period {
        Some(seconds) if seconds > 0 => i64::try_from(seconds)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or(Duration::MAX),
        _ => hours_to_duration(unlimited_hours),
    }
}

/// Returns the deadline by which a completion must be reviewed.
///
/// Saturates at [`DateTime::<Utc>::MAX_UTC`] instead of overflowing.
#[must_use]
pub fn review_deadline(
    completed_at: DateTime<Utc>,
    review_period: Option<u64>,
    unlimited_hours: u64,
) -> DateTime<Utc> {
    completed_at
        .checked_add_signed(review_window(review_period, unlimited_hours))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
