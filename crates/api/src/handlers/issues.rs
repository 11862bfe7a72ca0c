//! Handlers for issue CRUD and the status/timestamp actions.
//!
//! Every mutation that touches `status`, `solvedAt` or `submittedAt` loads
//! the stored row first, runs the matching rule from
//! [`fixit_core::reconcile`] and writes the resulting change in a single
//! `UPDATE`. A rejected request writes nothing.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;

use fixit_core::error::CoreError;
use fixit_core::listing::{PageRequest, Pagination, Sort};
use fixit_core::reconcile::{self, TimelineChange};
use fixit_core::types::DbId;
use fixit_db::models::issue::{
    parse_status_filter, CreateIssue, Issue, IssueChanges, IssueFilter, IssueListParams,
    UpdateIssue, UpdateSolvedTime, UpdateSubmittedTime,
};
use fixit_db::repositories::IssueRepo;
use sqlx::PgPool;

use crate::error::{AppError, AppResult};
use crate::extract::{ApiJson, ApiQuery, IssueId};
use crate::response::{ApiResponse, PageResponse};
use crate::state::AppState;

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound { entity: "Issue", id })
}

async fn load(pool: &PgPool, id: DbId) -> AppResult<Issue> {
    IssueRepo::find_by_id(pool, id).await?.ok_or_else(|| not_found(id))
}

/// Write a reconciled change. The row may have been deleted since it was loaded.
async fn write(pool: &PgPool, id: DbId, changes: &IssueChanges) -> AppResult<Issue> {
    IssueRepo::update(pool, id, changes)
        .await?
        .ok_or_else(|| not_found(id))
}

/// Run a page query and its count concurrently.
async fn fetch_page(
    pool: &PgPool,
    filter: &IssueFilter,
    sort: Sort,
    page: PageRequest,
) -> AppResult<PageResponse<Issue>> {
    let (issues, total) = tokio::try_join!(
        IssueRepo::list_page(pool, filter, sort, page),
        IssueRepo::count(pool, filter),
    )?;
    Ok(PageResponse {
        issues,
        pagination: Pagination::new(page, total),
    })
}

// ---------------------------------------------------------------------------
// POST /issues
// ---------------------------------------------------------------------------

/// Create an issue. It starts OPEN with `submittedAt` set to now.
pub async fn create_issue(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<CreateIssue>,
) -> AppResult<impl IntoResponse> {
    let new_issue = input.validate()?;
    let issue = IssueRepo::create(&state.pool, &new_issue).await?;

    tracing::info!(
        issue_id = issue.id,
        issue_number = %issue.issue_number,
        "Issue created",
    );

    Ok((StatusCode::CREATED, Json(ApiResponse::data(issue))))
}

// ---------------------------------------------------------------------------
// GET /issues
// ---------------------------------------------------------------------------

/// List issues, newest first by default, with an optional status filter.
pub async fn list_issues(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<IssueListParams>,
) -> AppResult<impl IntoResponse> {
    let filter = IssueFilter {
        status: parse_status_filter(params.status.as_deref())?,
        ..IssueFilter::default()
    };
    let sort = Sort::parse(
        params.sort_by.as_deref(),
        params.sort_order.as_deref(),
        Sort::NEWEST_CREATED,
    )?;
    let page = PageRequest::new(params.page, params.limit);

    let data = fetch_page(&state.pool, &filter, sort, page).await?;
    Ok(Json(ApiResponse::data(data)))
}

// ---------------------------------------------------------------------------
// GET /issues/number/{issue_number}
// ---------------------------------------------------------------------------

/// List every issue filed under one issue number, newest submission first.
///
/// Responds 404 when the number has no issues at all.
pub async fn list_by_number(
    State(state): State<AppState>,
    Path(issue_number): Path<String>,
    ApiQuery(params): ApiQuery<IssueListParams>,
) -> AppResult<impl IntoResponse> {
    let filter = IssueFilter {
        status: parse_status_filter(params.status.as_deref())?,
        issue_number: Some(issue_number),
        ..IssueFilter::default()
    };
    let sort = Sort::parse(
        params.sort_by.as_deref(),
        params.sort_order.as_deref(),
        Sort::NEWEST_SUBMITTED,
    )?;
    let page = PageRequest::new(params.page, params.limit);

    let data = fetch_page(&state.pool, &filter, sort, page).await?;
    if data.pagination.total == 0 {
        return Err(AppError::NotFound(
            "No issues found with this issue number".into(),
        ));
    }
    Ok(Json(ApiResponse::data(data)))
}

// ---------------------------------------------------------------------------
// GET /issues/{id}
// ---------------------------------------------------------------------------

pub async fn get_issue(
    State(state): State<AppState>,
    IssueId(id): IssueId,
) -> AppResult<impl IntoResponse> {
    let issue = load(&state.pool, id).await?;
    Ok(Json(ApiResponse::data(issue)))
}

// ---------------------------------------------------------------------------
// PUT /issues/{id}
// ---------------------------------------------------------------------------

/// Partial update. Descriptive fields are applied as sent; `status`,
/// `solvedAt` and `submittedAt` go through [`reconcile::reconcile_update`].
pub async fn update_issue(
    State(state): State<AppState>,
    IssueId(id): IssueId,
    ApiJson(input): ApiJson<UpdateIssue>,
) -> AppResult<impl IntoResponse> {
    let current = load(&state.pool, id).await?;

    let (mut changes, request) = input.split()?;
    changes.timeline = reconcile::reconcile_update(&current.timeline(), &request, Utc::now())?;

    let issue = write(&state.pool, id, &changes).await?;

    tracing::info!(
        issue_id = issue.id,
        status = %issue.status,
        "Issue updated",
    );

    Ok(Json(ApiResponse::data(issue)))
}

// ---------------------------------------------------------------------------
// DELETE /issues/{id}
// ---------------------------------------------------------------------------

pub async fn delete_issue(
    State(state): State<AppState>,
    IssueId(id): IssueId,
) -> AppResult<impl IntoResponse> {
    let deleted = IssueRepo::delete(&state.pool, id).await?;
    if !deleted {
        return Err(not_found(id));
    }

    tracing::info!(issue_id = id, "Issue deleted");

    Ok(Json(ApiResponse::message("Issue deleted successfully")))
}

// ---------------------------------------------------------------------------
// PATCH /issues/{id}/solve
// ---------------------------------------------------------------------------

/// Mark an open issue solved as of now. Fails if it is already solved.
pub async fn solve_issue(
    State(state): State<AppState>,
    IssueId(id): IssueId,
) -> AppResult<impl IntoResponse> {
    let current = load(&state.pool, id).await?;
    let change = reconcile::solve(&current.timeline(), Utc::now())?;

    let issue = apply_timeline(&state.pool, id, change).await?;
    tracing::info!(issue_id = issue.id, "Issue solved");

    Ok(Json(ApiResponse::data(issue)))
}

// ---------------------------------------------------------------------------
// PATCH /issues/{id}/solved-time
// ---------------------------------------------------------------------------

/// Correct `solvedAt`. A timestamp marks the issue solved; `null` reopens it.
pub async fn update_solved_time(
    State(state): State<AppState>,
    IssueId(id): IssueId,
    ApiJson(input): ApiJson<UpdateSolvedTime>,
) -> AppResult<impl IntoResponse> {
    let solved_at = input
        .solved_at
        .ok_or_else(|| AppError::BadRequest("solvedAt is required".into()))?;

    let current = load(&state.pool, id).await?;
    let change = reconcile::reconcile_solved_time(&current.timeline(), solved_at.as_deref())?;

    let issue = apply_timeline(&state.pool, id, change).await?;
    tracing::info!(
        issue_id = issue.id,
        status = %issue.status,
        "Issue solved time updated",
    );

    Ok(Json(ApiResponse::data(issue)))
}

// ---------------------------------------------------------------------------
// PATCH /issues/{id}/submitted-time
// ---------------------------------------------------------------------------

/// Correct `submittedAt`, keeping it before any existing `solvedAt`.
pub async fn update_submitted_time(
    State(state): State<AppState>,
    IssueId(id): IssueId,
    ApiJson(input): ApiJson<UpdateSubmittedTime>,
) -> AppResult<impl IntoResponse> {
    let current = load(&state.pool, id).await?;
    let change =
        reconcile::reconcile_submitted_time(&current.timeline(), input.submitted_at.as_deref())?;

    let issue = apply_timeline(&state.pool, id, change).await?;
    tracing::info!(issue_id = issue.id, "Issue submitted time updated");

    Ok(Json(ApiResponse::data(issue)))
}

async fn apply_timeline(pool: &PgPool, id: DbId, change: TimelineChange) -> AppResult<Issue> {
    write(pool, id, &IssueChanges::from(change)).await
}
