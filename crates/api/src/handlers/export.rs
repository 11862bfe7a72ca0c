//! Handler for the spreadsheet download.

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;

use fixit_core::export::{build_workbook, export_filename, ExportRow, XLSX_CONTENT_TYPE};
use fixit_core::listing::Sort;
use fixit_core::timestamp::DateRange;
use fixit_db::models::issue::{parse_status_filter, ExportParams, IssueFilter};
use fixit_db::repositories::IssueRepo;

use crate::error::AppResult;
use crate::extract::ApiQuery;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// GET /issues/export
// ---------------------------------------------------------------------------

/// Download matching issues as an XLSX workbook, newest submission first.
///
/// Times in the sheet and the filename use the server's local time zone.
pub async fn export_issues(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ExportParams>,
) -> AppResult<impl IntoResponse> {
    let filter = IssueFilter {
        status: parse_status_filter(params.status.as_deref())?,
        issue_number: None,
        submitted: DateRange::parse(params.start_date.as_deref(), params.end_date.as_deref())?,
    };

    let issues = IssueRepo::list_all(&state.pool, &filter, Sort::NEWEST_SUBMITTED).await?;

    let rows: Vec<ExportRow> = issues
        .iter()
        .map(|issue| ExportRow::from_record(&issue.export_record(), &chrono::Local))
        .collect();
    let buffer = build_workbook(&rows)?;
    let filename = export_filename(&chrono::Local::now());

    tracing::info!(rows = rows.len(), bytes = buffer.len(), %filename, "Issues exported");

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
            (header::CONTENT_LENGTH, buffer.len().to_string()),
        ],
        buffer,
    ))
}
