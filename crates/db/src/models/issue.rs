//! Issue entity model and DTOs.

use fixit_core::error::CoreError;
use fixit_core::export::ExportRecord;
use fixit_core::issue::{validate_location, validate_new_issue, IssueStatus, IssueType};
use fixit_core::reconcile::{IssueTimeline, Patch, TimelineChange, TimelineRequest};
use fixit_core::timestamp::DateRange;
use fixit_core::types::{DbId, Timestamp};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;

/// A row from the `issues` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub id: DbId,
    pub issue_number: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: String,
    #[sqlx(try_from = "String")]
    pub issue_type: IssueType,
    #[sqlx(try_from = "String")]
    pub status: IssueStatus,
    pub submitted_at: Timestamp,
    pub solved_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Issue {
    /// The status/timestamp columns, as consumed by the reconciliation rules.
    pub fn timeline(&self) -> IssueTimeline {
        IssueTimeline {
            status: self.status,
            submitted_at: self.submitted_at,
            solved_at: self.solved_at,
        }
    }

    /// Borrowed view used by the spreadsheet export.
    pub fn export_record(&self) -> ExportRecord<'_> {
        ExportRecord {
            issue_number: &self.issue_number,
            location: &self.location,
            issue_type: self.issue_type,
            title: self.title.as_deref(),
            description: self.description.as_deref(),
            status: self.status,
            submitted_at: self.submitted_at,
            solved_at: self.solved_at,
        }
    }
}

/// Request body for creating an issue.
///
/// Required fields are optional here so that a missing one produces a
/// specific validation message instead of a generic deserialization error.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIssue {
    pub issue_number: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub issue_type: Option<String>,
}

/// A validated insert.
#[derive(Debug, Clone)]
pub struct NewIssue {
    pub issue_number: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: String,
    pub issue_type: IssueType,
}

impl CreateIssue {
    pub fn validate(self) -> Result<NewIssue, CoreError> {
        let fields = validate_new_issue(
            self.issue_number.as_deref(),
            self.location.as_deref(),
            self.issue_type.as_deref(),
        )?;
        Ok(NewIssue {
            issue_number: fields.issue_number,
            title: self.title,
            description: self.description,
            location: fields.location,
            issue_type: fields.issue_type,
        })
    }
}

/// Request body for `PUT /issues/{id}`. Every field is optional; `title`,
/// `description`, `solvedAt` and `submittedAt` distinguish `null` from absent.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateIssue {
    #[serde(default, deserialize_with = "deserialize_present")]
    pub title: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_present")]
    pub description: Option<Option<String>>,
    pub location: Option<String>,
    pub issue_type: Option<String>,
    pub status: Option<String>,
    #[serde(default, deserialize_with = "deserialize_present")]
    pub solved_at: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_present")]
    pub submitted_at: Option<Option<String>>,
}

impl UpdateIssue {
    /// Validate the descriptive fields and split off the status/timestamp
    /// request, which still has to be reconciled against the stored row.
    pub fn split(self) -> Result<(IssueChanges, TimelineRequest), CoreError> {
        if let Some(ref location) = self.location {
            validate_location(location)?;
        }
        let issue_type = self
            .issue_type
            .as_deref()
            .map(str::parse::<IssueType>)
            .transpose()?;
        let status = self
            .status
            .as_deref()
            .map(str::parse::<IssueStatus>)
            .transpose()?;

        let changes = IssueChanges {
            title: self.title,
            description: self.description,
            location: self.location,
            issue_type,
            timeline: TimelineChange::default(),
        };
        let timeline = TimelineRequest {
            status,
            solved_at: Patch::from(self.solved_at),
            submitted_at: Patch::from(self.submitted_at),
        };
        Ok((changes, timeline))
    }
}

/// Request body for `PATCH /issues/{id}/solved-time`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSolvedTime {
    #[serde(default, deserialize_with = "deserialize_present")]
    pub solved_at: Option<Option<String>>,
}

/// Request body for `PATCH /issues/{id}/submitted-time`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSubmittedTime {
    pub submitted_at: Option<String>,
}

/// Columns to write in a single `UPDATE`. `None` leaves a column as is.
#[derive(Debug, Clone, Default)]
pub struct IssueChanges {
    pub title: Option<Option<String>>,
    pub description: Option<Option<String>>,
    pub location: Option<String>,
    pub issue_type: Option<IssueType>,
    pub timeline: TimelineChange,
}

impl From<TimelineChange> for IssueChanges {
    fn from(timeline: TimelineChange) -> Self {
        Self {
            timeline,
            ..Self::default()
        }
    }
}

/// Row selection shared by listing, counting, statistics and export.
#[derive(Debug, Clone, Default)]
pub struct IssueFilter {
    pub status: Option<IssueStatus>,
    pub issue_number: Option<String>,
    /// Inclusive bounds on `submitted_at`.
    pub submitted: DateRange,
}

/// Query parameters for `GET /issues` and `GET /issues/number/{issue_number}`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueListParams {
    pub status: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

/// Query parameters for `GET /issues/stats`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Query parameters for `GET /issues/export`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportParams {
    pub status: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Parse an optional `status` query value; empty means no filter.
pub fn parse_status_filter(status: Option<&str>) -> Result<Option<IssueStatus>, CoreError> {
    match status.map(str::trim) {
        Some(s) if !s.is_empty() => s.parse::<IssueStatus>().map(Some),
        _ => Ok(None),
    }
}

/// Wraps any present value (including `null`) in `Some`, so that together
/// with `#[serde(default)]` an absent field stays `None`.
fn deserialize_present<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}
