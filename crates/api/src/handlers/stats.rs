//! Handler for aggregate issue statistics.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use fixit_core::issue::IssueStatus;
use fixit_core::stats::{IssueStats, StatsPeriod};
use fixit_core::timestamp::{day_bounds, DateRange};
use fixit_db::models::issue::{IssueFilter, StatsParams};
use fixit_db::repositories::IssueRepo;

use crate::error::AppResult;
use crate::extract::ApiQuery;
use crate::response::ApiResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// GET /issues/stats
// ---------------------------------------------------------------------------

/// Counters over issues submitted within the optional `[startDate, endDate]`
/// range. `todayClaims` always covers the server's current local day.
pub async fn issue_stats(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<StatsParams>,
) -> AppResult<impl IntoResponse> {
    let range = DateRange::parse(params.start_date.as_deref(), params.end_date.as_deref())?;
    let all = IssueFilter {
        submitted: range,
        ..IssueFilter::default()
    };
    let open = IssueFilter {
        status: Some(IssueStatus::Open),
        ..all.clone()
    };
    let solved = IssueFilter {
        status: Some(IssueStatus::Solved),
        ..all.clone()
    };
    let (today_start, today_end) = day_bounds(&chrono::Local::now());

    let pool = &state.pool;
    let (total, open_count, solved_count, unique, today, solve_times) = tokio::try_join!(
        IssueRepo::count(pool, &all),
        IssueRepo::count(pool, &open),
        IssueRepo::count(pool, &solved),
        IssueRepo::count_distinct_numbers(pool, &all),
        IssueRepo::count_submitted_between(pool, today_start, today_end),
        IssueRepo::solve_times(pool, &all),
    )?;

    let stats = IssueStats::new(
        total,
        open_count,
        solved_count,
        unique,
        today,
        &solve_times,
        StatsPeriod::from_bounds(params.start_date.as_deref(), params.end_date.as_deref()),
    );

    tracing::debug!(
        total_issues = stats.total_issues,
        avg_solve_time_minutes = stats.avg_solve_time_minutes,
        "Computed issue statistics",
    );

    Ok(Json(ApiResponse::data(stats)))
}
