//! The one fixed-zone constant the pipeline needs (spec.md section 9,
//! "Time handling"): upstream wall-clock strings and daily-stats
//! bucketing both use `+08:00`. Everything else is an absolute instant.

use chrono::{DateTime, Duration as ChronoDuration, FixedOffset, NaiveDate, Utc};

pub const SOURCE_OFFSET_SECONDS: i32 = 8 * 3_600;

pub fn source_offset() -> FixedOffset {
    FixedOffset::east_opt(SOURCE_OFFSET_SECONDS).expect("valid fixed offset")
}

/// The `+08:00` wall-clock date a draw's `open_time` instant falls on,
/// used as the daily-stats bucket key (spec.md section 3, "Daily
/// statistics").
pub fn local_date(instant: DateTime<Utc>) -> NaiveDate {
    instant.with_timezone(&source_offset()).date_naive()
}

/// Seconds remaining until local midnight, used as the TTL for the
/// daily-stats per-issue idempotency marker (spec.md section 6.2,
/// `today_stats:processed:{date}:{issue}`).
pub fn seconds_until_midnight(instant: DateTime<Utc>) -> std::time::Duration {
    let local = instant.with_timezone(&source_offset());
    let next_midnight = (local.date_naive() + ChronoDuration::days(1))
        .and_hms_opt(0, 0, 0)
        .expect("midnight is a valid time");
    let remaining = next_midnight.signed_duration_since(local.naive_local());
    remaining.to_std().unwrap_or(std::time::Duration::from_secs(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn midnight_countdown_is_within_a_day() {
        let now = Utc::now();
        let d = seconds_until_midnight(now);
        assert!(d.as_secs() <= 86_400);
    }
}
