pub mod health;
pub mod issues;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /issues                                  create, list
/// /issues/stats                            aggregate counters
/// /issues/export                           XLSX download
/// /issues/number/{issue_number}            list by issue number
/// /issues/{id}                             get, update, delete
/// /issues/{id}/solve                       mark solved now (PATCH)
/// /issues/{id}/solved-time                 correct solvedAt (PATCH)
/// /issues/{id}/submitted-time              correct submittedAt (PATCH)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/issues", issues::router())
}
