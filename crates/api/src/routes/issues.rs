//! Route definitions for issues.
//!
//! Mounted at `/issues` by `api_routes()`.

use axum::routing::{get, patch, post};
use axum::Router;

use crate::handlers::{export, issues, stats};
use crate::state::AppState;

/// Issue routes. Static segments are matched before `{id}`.
///
/// ```text
/// POST   /                        -> create_issue
/// GET    /                        -> list_issues
/// GET    /stats                   -> issue_stats
/// GET    /export                  -> export_issues
/// GET    /number/{issue_number}   -> list_by_number
/// GET    /{id}                    -> get_issue
/// PUT    /{id}                    -> update_issue
/// DELETE /{id}                    -> delete_issue
/// PATCH  /{id}/solve              -> solve_issue
/// PATCH  /{id}/solved-time        -> update_solved_time
/// PATCH  /{id}/submitted-time     -> update_submitted_time
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(issues::create_issue).get(issues::list_issues))
        .route("/stats", get(stats::issue_stats))
        .route("/export", get(export::export_issues))
        .route("/number/{issue_number}", get(issues::list_by_number))
        .route(
            "/{id}",
            get(issues::get_issue)
                .put(issues::update_issue)
                .delete(issues::delete_issue),
        )
        .route("/{id}/solve", patch(issues::solve_issue))
        .route("/{id}/solved-time", patch(issues::update_solved_time))
        .route("/{id}/submitted-time", patch(issues::update_submitted_time))
}
