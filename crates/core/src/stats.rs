//! Aggregate issue statistics.

use serde::Serialize;

use crate::duration::{elapsed_millis, format_minutes};
use crate::types::Timestamp;

/// Label reported for an open end of the statistics period.
pub const ALL_TIME: &str = "All time";

/// Average solve time over `(submitted_at, solved_at)` pairs, in whole
/// minutes (nearest, half up). Zero when there are no pairs.
///
/// Pairs where `solved_at` precedes `submitted_at` count as zero elapsed.
pub fn average_solve_minutes(pairs: &[(Timestamp, Timestamp)]) -> i64 {
    if pairs.is_empty() {
        return 0;
    }
    let total_ms: i64 = pairs
        .iter()
        .map(|(submitted, solved)| elapsed_millis(*submitted, *solved))
        .sum();
    let divisor = pairs.len() as i64 * 60_000;
    (total_ms + divisor / 2) / divisor
}

/// The reporting window echoed back to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsPeriod {
    pub start_date: String,
    pub end_date: String,
}

impl StatsPeriod {
    /// Echo the raw query bounds, substituting [`ALL_TIME`] for absent ones.
    pub fn from_bounds(start: Option<&str>, end: Option<&str>) -> Self {
        let label = |v: Option<&str>| match v.map(str::trim) {
            Some(s) if !s.is_empty() => s.to_string(),
            _ => ALL_TIME.to_string(),
        };
        Self {
            start_date: label(start),
            end_date: label(end),
        }
    }
}

/// Payload of `GET /issues/stats`.
///
/// The counters keep their established `...Claims` wire names, which
/// existing dashboards read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueStats {
    #[serde(rename = "totalClaims")]
    pub total_issues: i64,
    #[serde(rename = "openClaims")]
    pub open_issues: i64,
    #[serde(rename = "solvedClaims")]
    pub solved_issues: i64,
    pub unique_issue_numbers: i64,
    /// Submitted during the server's current local day, regardless of period.
    #[serde(rename = "todayClaims")]
    pub today_issues: i64,
    pub avg_solve_time_minutes: i64,
    /// `avg_solve_time_minutes` rendered by the duration formatter.
    pub avg_solve_time: String,
    pub period: StatsPeriod,
}

impl IssueStats {
    /// Fill in the derived solve-time fields from the raw counters.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        total_issues: i64,
        open_issues: i64,
        solved_issues: i64,
        unique_issue_numbers: i64,
        today_issues: i64,
        solve_times: &[(Timestamp, Timestamp)],
        period: StatsPeriod,
    ) -> Self {
        let avg = average_solve_minutes(solve_times);
        Self {
            total_issues,
            open_issues,
            solved_issues,
            unique_issue_numbers,
            today_issues,
            avg_solve_time_minutes: avg,
            avg_solve_time: format_minutes(avg),
            period,
        }
    }
}
