//! Status / timestamp reconciliation for issue updates.
//!
//! Every mutation that touches `status`, `solvedAt` or `submittedAt` goes
//! through one of the functions here. Each takes the stored
//! [`IssueTimeline`] plus the request and returns a [`TimelineChange`]
//! describing exactly which columns to write, or a [`CoreError`] if the
//! request must be rejected. Nothing is written when an error is returned.
//!
//! Rules for a general update, in order:
//!
//! 1. `status = SOLVED` on a non-solved issue without `solvedAt` stamps
//!    `solvedAt = now`.
//! 2. `status = OPEN` without `solvedAt` clears `solvedAt`.
//! 3. `solvedAt = null` clears it and, unless `status` was given, reopens.
//! 4. `solvedAt = <ts>` must be strictly after the effective `submittedAt`
//!    and, unless `status` was given, marks the issue solved.
//!
//! Explicit `solvedAt` always wins over the status-driven defaults.

use crate::error::CoreError;
use crate::issue::IssueStatus;
use crate::timestamp::parse_timestamp;
use crate::types::Timestamp;

/// The status/timestamp columns of a stored issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IssueTimeline {
    pub status: IssueStatus,
    pub submitted_at: Timestamp,
    pub solved_at: Option<Timestamp>,
}

/// A request field that distinguishes "not sent" from an explicit `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Patch<T> {
    #[default]
    Absent,
    Null,
    Value(T),
}

impl<T> Patch<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Patch::Absent)
    }

    pub fn as_ref(&self) -> Patch<&T> {
        match self {
            Patch::Absent => Patch::Absent,
            Patch::Null => Patch::Null,
            Patch::Value(v) => Patch::Value(v),
        }
    }
}

impl<T> From<Option<Option<T>>> for Patch<T> {
    fn from(value: Option<Option<T>>) -> Self {
        match value {
            None => Patch::Absent,
            Some(None) => Patch::Null,
            Some(Some(v)) => Patch::Value(v),
        }
    }
}

/// The status/timestamp part of a general update request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimelineRequest {
    pub status: Option<IssueStatus>,
    pub solved_at: Patch<String>,
    pub submitted_at: Patch<String>,
}

/// Columns to write. `None` leaves a column untouched; for `solved_at`,
/// `Some(None)` clears it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimelineChange {
    pub status: Option<IssueStatus>,
    pub submitted_at: Option<Timestamp>,
    pub solved_at: Option<Option<Timestamp>>,
}

impl TimelineChange {
    /// The timeline that results from writing this change over `current`.
    pub fn apply(&self, current: &IssueTimeline) -> IssueTimeline {
        IssueTimeline {
            status: self.status.unwrap_or(current.status),
            submitted_at: self.submitted_at.unwrap_or(current.submitted_at),
            solved_at: self.solved_at.unwrap_or(current.solved_at),
        }
    }
}

/// Reconcile a general partial update (`PUT /issues/{id}`).
pub fn reconcile_update(
    current: &IssueTimeline,
    request: &TimelineRequest,
    now: Timestamp,
) -> Result<TimelineChange, CoreError> {
    let mut change = TimelineChange::default();

    match request.submitted_at.as_ref() {
        Patch::Absent => {}
        Patch::Null => {
            return Err(CoreError::Validation("submittedAt cannot be null".into()));
        }
        Patch::Value(raw) => {
            change.submitted_at = Some(parse_timestamp(raw, "submittedAt")?);
        }
    }
    let effective_submitted = change.submitted_at.unwrap_or(current.submitted_at);

    if let Some(status) = request.status {
        change.status = Some(status);
        if request.solved_at.is_absent() {
            match status {
                IssueStatus::Solved if current.status != IssueStatus::Solved => {
                    change.solved_at = Some(Some(now));
                }
                IssueStatus::Open => change.solved_at = Some(None),
                IssueStatus::Solved => {}
            }
        }
    }

    match request.solved_at.as_ref() {
        Patch::Absent => {}
        Patch::Null => {
            change.solved_at = Some(None);
            if request.status.is_none() {
                change.status = Some(IssueStatus::Open);
            }
        }
        Patch::Value(raw) => {
            let solved_at = parse_timestamp(raw, "solvedAt")?;
            ensure_solved_after_submitted(solved_at, effective_submitted)?;
            change.solved_at = Some(Some(solved_at));
            if request.status.is_none() {
                change.status = Some(IssueStatus::Solved);
            }
        }
    }

    // A moved submittedAt must still precede whatever solvedAt ends up stored.
    if change.submitted_at.is_some() {
        let next = change.apply(current);
        if let Some(solved_at) = next.solved_at {
            ensure_solved_after_submitted(solved_at, next.submitted_at)?;
        }
    }

    Ok(change)
}

/// Reconcile the dedicated solved-time correction (`PATCH /issues/{id}/solved-time`).
///
/// `None` means an explicit `null`: the issue is reopened. A value must be
/// strictly after the stored `submittedAt` and marks the issue solved.
pub fn reconcile_solved_time(
    current: &IssueTimeline,
    solved_at: Option<&str>,
) -> Result<TimelineChange, CoreError> {
    match solved_at {
        None => Ok(TimelineChange {
            status: Some(IssueStatus::Open),
            submitted_at: None,
            solved_at: Some(None),
        }),
        Some(raw) => {
            let solved_at = parse_timestamp(raw, "solvedAt")?;
            ensure_solved_after_submitted(solved_at, current.submitted_at)?;
            Ok(TimelineChange {
                status: Some(IssueStatus::Solved),
                submitted_at: None,
                solved_at: Some(Some(solved_at)),
            })
        }
    }
}

/// Reconcile the dedicated submitted-time correction
/// (`PATCH /issues/{id}/submitted-time`).
///
/// The new value is required and, when the issue already has a `solvedAt`,
/// must be strictly before it.
pub fn reconcile_submitted_time(
    current: &IssueTimeline,
    submitted_at: Option<&str>,
) -> Result<TimelineChange, CoreError> {
    let raw = submitted_at
        .ok_or_else(|| CoreError::Validation("submittedAt is required".into()))?;
    let submitted_at = parse_timestamp(raw, "submittedAt")?;

    if let Some(solved_at) = current.solved_at {
        if submitted_at >= solved_at {
            return Err(CoreError::Validation(
                "Submitted time must be before solved time".into(),
            ));
        }
    }

    Ok(TimelineChange {
        submitted_at: Some(submitted_at),
        ..TimelineChange::default()
    })
}

/// The dedicated solve action (`PATCH /issues/{id}/solve`).
pub fn solve(current: &IssueTimeline, now: Timestamp) -> Result<TimelineChange, CoreError> {
    if current.status == IssueStatus::Solved {
        return Err(CoreError::InvalidTransition("Issue is already solved".into()));
    }
    Ok(TimelineChange {
        status: Some(IssueStatus::Solved),
        submitted_at: None,
        solved_at: Some(Some(now)),
    })
}

fn ensure_solved_after_submitted(
    solved_at: Timestamp,
    submitted_at: Timestamp,
) -> Result<(), CoreError> {
    if solved_at <= submitted_at {
        return Err(CoreError::Validation(
            "Solved time must be after submitted time".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::{DateTime, Duration, Utc};

    use super::*;

    fn ts(s: &str) -> Timestamp {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn open_issue() -> IssueTimeline {
        IssueTimeline {
            status: IssueStatus::Open,
            submitted_at: ts("2024-05-01T08:00:00Z"),
            solved_at: None,
        }
    }

    fn solved_issue() -> IssueTimeline {
        IssueTimeline {
            status: IssueStatus::Solved,
            submitted_at: ts("2024-05-01T08:00:00Z"),
            solved_at: Some(ts("2024-05-01T10:00:00Z")),
        }
    }

    fn now() -> Timestamp {
        ts("2024-05-02T09:30:00Z")
    }

    fn status_only(status: IssueStatus) -> TimelineRequest {
        TimelineRequest {
            status: Some(status),
            ..TimelineRequest::default()
        }
    }

    fn solved_at(raw: Option<&str>) -> TimelineRequest {
        TimelineRequest {
            solved_at: match raw {
                Some(v) => Patch::Value(v.to_string()),
                None => Patch::Null,
            },
            ..TimelineRequest::default()
        }
    }

    // -- reconcile_update: status-driven defaults ---------------------------

    #[test]
    fn solving_an_open_issue_stamps_now() {
        let change = reconcile_update(&open_issue(), &status_only(IssueStatus::Solved), now())
            .unwrap();
        assert_eq!(change.status, Some(IssueStatus::Solved));
        assert_eq!(change.solved_at, Some(Some(now())));
    }

    #[test]
    fn solved_status_on_solved_issue_keeps_existing_time() {
        let change =
            reconcile_update(&solved_issue(), &status_only(IssueStatus::Solved), now()).unwrap();
        assert_eq!(change.status, Some(IssueStatus::Solved));
        assert_eq!(change.solved_at, None);
        assert_eq!(change.apply(&solved_issue()).solved_at, solved_issue().solved_at);
    }

    #[test]
    fn reopening_clears_solved_time() {
        let change =
            reconcile_update(&solved_issue(), &status_only(IssueStatus::Open), now()).unwrap();
        assert_eq!(change.status, Some(IssueStatus::Open));
        assert_eq!(change.solved_at, Some(None));
    }

    #[test]
    fn empty_request_changes_nothing() {
        let change = reconcile_update(&solved_issue(), &TimelineRequest::default(), now()).unwrap();
        assert_eq!(change, TimelineChange::default());
    }

    // -- reconcile_update: explicit solvedAt ---------------------------------

    #[test]
    fn null_solved_at_reopens_when_status_not_given() {
        let change = reconcile_update(&solved_issue(), &solved_at(None), now()).unwrap();
        assert_eq!(change.status, Some(IssueStatus::Open));
        assert_eq!(change.solved_at, Some(None));
    }

    #[test]
    fn null_solved_at_keeps_explicit_status() {
        let request = TimelineRequest {
            status: Some(IssueStatus::Solved),
            solved_at: Patch::Null,
            ..TimelineRequest::default()
        };
        let change = reconcile_update(&open_issue(), &request, now()).unwrap();
        assert_eq!(change.status, Some(IssueStatus::Solved));
        assert_eq!(change.solved_at, Some(None));
    }

    #[test]
    fn solved_at_after_submission_marks_solved() {
        let change =
            reconcile_update(&open_issue(), &solved_at(Some("2024-05-01T09:00:00Z")), now())
                .unwrap();
        assert_eq!(change.status, Some(IssueStatus::Solved));
        assert_eq!(change.solved_at, Some(Some(ts("2024-05-01T09:00:00Z"))));
    }

    #[test]
    fn solved_at_equal_to_submission_is_rejected() {
        let err = reconcile_update(&open_issue(), &solved_at(Some("2024-05-01T08:00:00Z")), now())
            .unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) if msg.contains("after submitted"));
    }

    #[test]
    fn solved_at_before_submission_is_rejected() {
        let err = reconcile_update(&open_issue(), &solved_at(Some("2024-04-30T08:00:00Z")), now())
            .unwrap_err();
        assert_matches!(err, CoreError::Validation(_));
    }

    #[test]
    fn explicit_solved_at_beats_status_default() {
        let request = TimelineRequest {
            status: Some(IssueStatus::Solved),
            solved_at: Patch::Value("2024-05-01T09:15:00Z".into()),
            ..TimelineRequest::default()
        };
        let change = reconcile_update(&open_issue(), &request, now()).unwrap();
        assert_eq!(change.solved_at, Some(Some(ts("2024-05-01T09:15:00Z"))));
    }

    #[test]
    fn explicit_status_open_with_solved_at_keeps_open() {
        let request = TimelineRequest {
            status: Some(IssueStatus::Open),
            solved_at: Patch::Value("2024-05-01T09:15:00Z".into()),
            ..TimelineRequest::default()
        };
        let change = reconcile_update(&open_issue(), &request, now()).unwrap();
        assert_eq!(change.status, Some(IssueStatus::Open));
        assert_eq!(change.solved_at, Some(Some(ts("2024-05-01T09:15:00Z"))));
    }

    #[test]
    fn malformed_solved_at_is_rejected() {
        let err = reconcile_update(&open_issue(), &solved_at(Some("not a date")), now())
            .unwrap_err();
        assert_matches!(err, CoreError::Validation(_));
    }

    // -- reconcile_update: submittedAt in the same request -------------------

    #[test]
    fn solved_at_is_checked_against_submitted_at_from_same_request() {
        let request = TimelineRequest {
            solved_at: Patch::Value("2024-05-01T09:00:00Z".into()),
            submitted_at: Patch::Value("2024-05-01T09:30:00Z".into()),
            ..TimelineRequest::default()
        };
        let err = reconcile_update(&open_issue(), &request, now()).unwrap_err();
        assert_matches!(err, CoreError::Validation(_));

        let request = TimelineRequest {
            solved_at: Patch::Value("2024-05-01T07:30:00Z".into()),
            submitted_at: Patch::Value("2024-05-01T07:00:00Z".into()),
            ..TimelineRequest::default()
        };
        let change = reconcile_update(&open_issue(), &request, now()).unwrap();
        assert_eq!(change.submitted_at, Some(ts("2024-05-01T07:00:00Z")));
        assert_eq!(change.solved_at, Some(Some(ts("2024-05-01T07:30:00Z"))));
    }

    #[test]
    fn moving_submission_past_stored_solve_time_is_rejected() {
        let request = TimelineRequest {
            submitted_at: Patch::Value("2024-05-01T11:00:00Z".into()),
            ..TimelineRequest::default()
        };
        let err = reconcile_update(&solved_issue(), &request, now()).unwrap_err();
        assert_matches!(err, CoreError::Validation(_));
    }

    #[test]
    fn moving_submission_while_reopening_is_allowed() {
        let request = TimelineRequest {
            status: Some(IssueStatus::Open),
            submitted_at: Patch::Value("2024-05-01T11:00:00Z".into()),
            ..TimelineRequest::default()
        };
        let change = reconcile_update(&solved_issue(), &request, now()).unwrap();
        let next = change.apply(&solved_issue());
        assert_eq!(next.status, IssueStatus::Open);
        assert_eq!(next.solved_at, None);
        assert_eq!(next.submitted_at, ts("2024-05-01T11:00:00Z"));
    }

    #[test]
    fn null_submitted_at_is_rejected() {
        let request = TimelineRequest {
            submitted_at: Patch::Null,
            ..TimelineRequest::default()
        };
        assert_matches!(
            reconcile_update(&open_issue(), &request, now()),
            Err(CoreError::Validation(_))
        );
    }

    // -- reconcile_solved_time -----------------------------------------------

    #[test]
    fn solved_time_null_reopens() {
        let change = reconcile_solved_time(&solved_issue(), None).unwrap();
        let next = change.apply(&solved_issue());
        assert_eq!(next.status, IssueStatus::Open);
        assert_eq!(next.solved_at, None);
    }

    #[test]
    fn solved_time_value_marks_solved() {
        let change = reconcile_solved_time(&open_issue(), Some("2024-05-01T12:00:00Z")).unwrap();
        let next = change.apply(&open_issue());
        assert_eq!(next.status, IssueStatus::Solved);
        assert_eq!(next.solved_at, Some(ts("2024-05-01T12:00:00Z")));
        assert_eq!(next.submitted_at, open_issue().submitted_at);
    }

    #[test]
    fn solved_time_not_after_submission_is_rejected() {
        assert_matches!(
            reconcile_solved_time(&open_issue(), Some("2024-05-01T08:00:00Z")),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn solved_time_empty_string_is_rejected() {
        assert_matches!(
            reconcile_solved_time(&open_issue(), Some("")),
            Err(CoreError::Validation(_))
        );
    }

    // -- reconcile_submitted_time --------------------------------------------

    #[test]
    fn submitted_time_is_required() {
        assert_matches!(
            reconcile_submitted_time(&open_issue(), None),
            Err(CoreError::Validation(msg)) if msg == "submittedAt is required"
        );
        assert_matches!(
            reconcile_submitted_time(&open_issue(), Some("")),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn submitted_time_on_open_issue_is_unconstrained() {
        let change = reconcile_submitted_time(&open_issue(), Some("2030-01-01T00:00:00Z")).unwrap();
        assert_eq!(change.submitted_at, Some(ts("2030-01-01T00:00:00Z")));
        assert_eq!(change.status, None);
        assert_eq!(change.solved_at, None);
    }

    #[test]
    fn submitted_time_must_precede_solved_time() {
        let at_solve = reconcile_submitted_time(&solved_issue(), Some("2024-05-01T10:00:00Z"));
        assert_matches!(at_solve, Err(CoreError::Validation(_)));

        let before = reconcile_submitted_time(&solved_issue(), Some("2024-05-01T09:59:00Z"));
        assert!(before.is_ok());
    }

    // -- solve ---------------------------------------------------------------

    #[test]
    fn solve_open_issue_stamps_now() {
        let change = solve(&open_issue(), now()).unwrap();
        assert_eq!(change.status, Some(IssueStatus::Solved));
        assert_eq!(change.solved_at, Some(Some(now())));
    }

    #[test]
    fn solve_already_solved_issue_fails() {
        assert_matches!(
            solve(&solved_issue(), now()),
            Err(CoreError::InvalidTransition(msg)) if msg == "Issue is already solved"
        );
    }

    #[test]
    fn solve_uses_the_supplied_clock() {
        let later = now() + Duration::hours(3);
        let change = solve(&open_issue(), later).unwrap();
        assert_eq!(change.solved_at, Some(Some(later)));
    }
}
