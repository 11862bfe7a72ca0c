//! Timestamp parsing and calendar helpers.
//!
//! Client-supplied timestamps arrive as strings. Accepted forms:
//!
//! | Form                         | Interpretation        |
//! |------------------------------|-----------------------|
//! | RFC 3339 (`...Z`, `+02:00`)  | as given              |
//! | `YYYY-MM-DDTHH:MM:SS[.fff]`  | UTC                   |
//! | `YYYY-MM-DD HH:MM:SS[.fff]`  | UTC                   |
//! | `YYYY-MM-DD`                 | UTC midnight          |

use chrono::{DateTime, Days, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

use crate::error::CoreError;
use crate::types::Timestamp;

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse a client-supplied timestamp. `field` names the input in error messages.
///
/// Empty or whitespace-only input is reported as missing.
pub fn parse_timestamp(raw: &str, field: &str) -> Result<Timestamp, CoreError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(CoreError::Validation(format!("{field} is required")));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, fmt) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN).and_utc());
    }

    Err(CoreError::Validation(format!(
        "Invalid {field}: '{value}' is not a valid date"
    )))
}

/// Inclusive `submittedAt` filter built from optional `startDate` / `endDate`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<Timestamp>,
    pub end: Option<Timestamp>,
}

impl DateRange {
    /// Parse optional bounds. Absent or empty strings leave that side open.
    pub fn parse(start: Option<&str>, end: Option<&str>) -> Result<Self, CoreError> {
        let bound = |raw: Option<&str>, field: &str| -> Result<Option<Timestamp>, CoreError> {
            match raw.map(str::trim) {
                Some(v) if !v.is_empty() => parse_timestamp(v, field).map(Some),
                _ => Ok(None),
            }
        };

        Ok(Self {
            start: bound(start, "startDate")?,
            end: bound(end, "endDate")?,
        })
    }
}

/// `[midnight today, midnight tomorrow)` in the time zone of `now`, as UTC.
pub fn day_bounds<Tz: TimeZone>(now: &DateTime<Tz>) -> (Timestamp, Timestamp) {
    let tz = now.timezone();
    let today = now.date_naive();
    let tomorrow = today.checked_add_days(Days::new(1)).unwrap_or(today);
    (midnight_in(&tz, today), midnight_in(&tz, tomorrow))
}

fn midnight_in<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> Timestamp {
    let naive = date.and_time(NaiveTime::MIN);
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        // Midnight skipped by a DST jump: fall back to the UTC reading.
        .unwrap_or_else(|| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::FixedOffset;

    use super::*;

    fn utc(s: &str) -> Timestamp {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn parses_rfc3339_with_offset() {
        let ts = parse_timestamp("2024-05-01T12:00:00+02:00", "solvedAt").unwrap();
        assert_eq!(ts, utc("2024-05-01T10:00:00Z"));
    }

    #[test]
    fn naive_forms_are_utc() {
        let expected = utc("2024-05-01T10:30:00Z");
        assert_eq!(parse_timestamp("2024-05-01T10:30:00", "x").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-05-01 10:30:00", "x").unwrap(), expected);
        assert_eq!(
            parse_timestamp("2024-05-01T10:30:00.250", "x").unwrap(),
            expected + chrono::Duration::milliseconds(250)
        );
    }

    #[test]
    fn date_only_is_utc_midnight() {
        let ts = parse_timestamp("2024-05-01", "startDate").unwrap();
        assert_eq!(ts, utc("2024-05-01T00:00:00Z"));
    }

    #[test]
    fn empty_is_reported_as_missing() {
        let err = parse_timestamp("  ", "submittedAt").unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) if msg == "submittedAt is required");
    }

    #[test]
    fn garbage_is_rejected() {
        let err = parse_timestamp("yesterday", "solvedAt").unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) if msg.contains("yesterday"));
    }

    #[test]
    fn date_range_treats_empty_bounds_as_open() {
        let range = DateRange::parse(Some(""), None).unwrap();
        assert_eq!(range, DateRange::default());
    }

    #[test]
    fn date_range_keeps_both_bounds() {
        let range = DateRange::parse(Some("2024-01-01"), Some("2024-01-31T23:59:59Z")).unwrap();
        assert_eq!(range.start, Some(utc("2024-01-01T00:00:00Z")));
        assert_eq!(range.end, Some(utc("2024-01-31T23:59:59Z")));
    }

    #[test]
    fn date_range_rejects_bad_bound() {
        assert_matches!(
            DateRange::parse(None, Some("soon")),
            Err(CoreError::Validation(msg)) if msg.contains("endDate")
        );
    }

    #[test]
    fn day_bounds_follow_the_local_calendar() {
        let tz = FixedOffset::east_opt(3 * 3600).unwrap();
        let now = tz.with_ymd_and_hms(2024, 3, 10, 1, 15, 0).unwrap();

        let (start, end) = day_bounds(&now);

        assert_eq!(start, utc("2024-03-09T21:00:00Z"));
        assert_eq!(end, utc("2024-03-10T21:00:00Z"));
    }
}
