//! Plain-text rendering for task lists.

use chrono::{DateTime, Local};

const MINUTE_MS: i64 = 60 * 1000;
const HOUR_MS: i64 = 60 * MINUTE_MS;
const DAY_MS: i64 = 24 * HOUR_MS;

/// Age of `timestamp_ms` relative to `now_ms`: `Just now`, `5m ago`,
/// `3h ago`, `2d ago`, then a calendar date after a week.
pub fn relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let elapsed = now_ms.saturating_sub(timestamp_ms);
    if elapsed < MINUTE_MS {
        return "Just now".to_string();
    }
    if elapsed < HOUR_MS {
        return format!("{}m ago", elapsed / MINUTE_MS);
    }
    if elapsed < DAY_MS {
        return format!("{}h ago", elapsed / HOUR_MS);
    }
    if elapsed < 7 * DAY_MS {
        return format!("{}d ago", elapsed / DAY_MS);
    }
    DateTime::from_timestamp_millis(timestamp_ms)
        .map(|at| at.with_timezone(&Local).format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| timestamp_ms.to_string())
}

#[cfg(test)]
mod tests {
    use super::{relative_time, DAY_MS, HOUR_MS, MINUTE_MS};

    #[test]
    fn buckets_follow_elapsed_time() {
        let now = 10 * DAY_MS;
        assert_eq!(relative_time(now - 59_999, now), "Just now");
        assert_eq!(relative_time(now - 5 * MINUTE_MS, now), "5m ago");
        assert_eq!(relative_time(now - 3 * HOUR_MS - 1, now), "3h ago");
        assert_eq!(relative_time(now - 2 * DAY_MS, now), "2d ago");
        assert_eq!(relative_time(now - 8 * DAY_MS, now).len(), "1970-01-03".len());
    }

    #[test]
    fn out_of_range_timestamps_do_not_overflow() {
        let now = 10 * DAY_MS;
        assert_eq!(relative_time(i64::MIN, now), i64::MIN.to_string());
        assert_eq!(relative_time(i64::MAX, now), "Just now");
    }
}
