//! Compact human-readable durations (`"45m"`, `"3h 5m"`, `"2d 4h"`).

use crate::types::Timestamp;

const MS_PER_MINUTE: i64 = 60 * 1000;
const MINUTES_PER_HOUR: i64 = 60;
const HOURS_PER_DAY: i64 = 24;

/// Round elapsed milliseconds to the nearest whole minute (half rounds up).
///
/// Negative input is clamped to zero.
pub fn round_to_minutes(milliseconds: i64) -> i64 {
    let ms = milliseconds.max(0);
    (ms + MS_PER_MINUTE / 2) / MS_PER_MINUTE
}

/// Format elapsed milliseconds as `"<n>m"`, `"<h>h[ <m>m]"` or `"<d>d[ <h>h][ <m>m]"`.
///
/// The value is first rounded to the nearest minute. Zero components after
/// the leading one are omitted. Negative input is clamped to zero.
pub fn format_duration(milliseconds: i64) -> String {
    format_minutes(round_to_minutes(milliseconds))
}

/// Format a whole number of minutes with the same rules as [`format_duration`].
pub fn format_minutes(total_minutes: i64) -> String {
    let total_minutes = total_minutes.max(0);
    if total_minutes < MINUTES_PER_HOUR {
        return format!("{total_minutes}m");
    }

    let total_hours = total_minutes / MINUTES_PER_HOUR;
    let minutes = total_minutes % MINUTES_PER_HOUR;

    if total_hours < HOURS_PER_DAY {
        return if minutes > 0 {
            format!("{total_hours}h {minutes}m")
        } else {
            format!("{total_hours}h")
        };
    }

    let days = total_hours / HOURS_PER_DAY;
    let hours = total_hours % HOURS_PER_DAY;

    let mut out = format!("{days}d");
    if hours > 0 {
        out.push_str(&format!(" {hours}h"));
    }
    if minutes > 0 {
        out.push_str(&format!(" {minutes}m"));
    }
    out
}

/// Milliseconds from `start` to `end`, clamped at zero.
pub fn elapsed_millis(start: Timestamp, end: Timestamp) -> i64 {
    (end - start).num_milliseconds().max(0)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    const MIN: i64 = MS_PER_MINUTE;
    const HOUR: i64 = 60 * MIN;
    const DAY: i64 = 24 * HOUR;

    /// Inverse of `format_minutes`, used to check the format is lossless.
    fn parse_minutes(s: &str) -> i64 {
        s.split(' ')
            .map(|part| {
                let (num, unit) = part.split_at(part.len() - 1);
                let n: i64 = num.parse().unwrap();
                match unit {
                    "d" => n * 24 * 60,
                    "h" => n * 60,
                    "m" => n,
                    other => panic!("unexpected unit {other}"),
                }
            })
            .sum()
    }

    #[test]
    fn zero_is_zero_minutes() {
        assert_eq!(format_duration(0), "0m");
    }

    #[test]
    fn rounds_to_nearest_minute() {
        assert_eq!(format_duration(29_999), "0m");
        assert_eq!(format_duration(30_000), "1m");
        assert_eq!(format_duration(59 * MIN + 29_000), "59m");
        assert_eq!(format_duration(59 * MIN + 30_000), "1h");
    }

    #[test]
    fn hours_with_and_without_minutes() {
        assert_eq!(format_duration(90 * MIN), "1h 30m");
        assert_eq!(format_duration(2 * HOUR), "2h");
        assert_eq!(format_duration(23 * HOUR + 59 * MIN), "23h 59m");
    }

    #[test]
    fn days_omit_zero_components() {
        assert_eq!(format_duration(DAY), "1d");
        assert_eq!(format_duration(25 * HOUR), "1d 1h");
        assert_eq!(format_duration(2 * DAY + 5 * MIN), "2d 5m");
        assert_eq!(format_duration(3 * DAY + 4 * HOUR + 7 * MIN), "3d 4h 7m");
    }

    #[test]
    fn negative_input_is_clamped() {
        assert_eq!(format_duration(-5 * HOUR), "0m");
        assert_eq!(round_to_minutes(-1), 0);
    }

    #[test]
    fn elapsed_is_never_negative() {
        let t0 = chrono::Utc::now();
        let t1 = t0 + chrono::Duration::minutes(5);
        assert_eq!(elapsed_millis(t0, t1), 5 * MIN);
        assert_eq!(elapsed_millis(t1, t0), 0);
    }

    proptest! {
        #[test]
        fn formatted_minutes_parse_back(minutes in 0i64..10_000_000) {
            prop_assert_eq!(parse_minutes(&format_minutes(minutes)), minutes);
        }

        #[test]
        fn format_duration_matches_rounded_minutes(ms in 0i64..1_000_000_000_000) {
            prop_assert_eq!(parse_minutes(&format_duration(ms)), round_to_minutes(ms));
        }
    }
}
