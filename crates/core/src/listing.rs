//! Pagination and sorting for issue listings.
//!
//! Pages are 1-indexed. Sorting is restricted to a fixed set of fields so
//! that client input never reaches SQL verbatim.

use std::str::FromStr;

use serde::Serialize;

use crate::error::CoreError;

/// Default page size when `limit` is not supplied.
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Upper bound for `limit`; larger requests are clamped.
pub const MAX_PAGE_SIZE: i64 = 100;

/// A validated page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    /// Build from optional query values. `page` floors at 1, `limit` is
    /// clamped into `1..=MAX_PAGE_SIZE`.
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Rows to skip for this page.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

/// The `pagination` block returned alongside a page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub pages: i64,
}

impl Pagination {
    pub fn new(request: PageRequest, total: i64) -> Self {
        let total = total.max(0);
        Self {
            page: request.page,
            limit: request.limit,
            total,
            pages: (total + request.limit - 1) / request.limit,
        }
    }
}

/// Fields an issue listing may be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    CreatedAt,
    UpdatedAt,
    SubmittedAt,
    SolvedAt,
    IssueNumber,
    Location,
    IssueType,
    Status,
    Title,
}

impl SortField {
    pub const ALL: &'static [SortField] = &[
        SortField::CreatedAt,
        SortField::UpdatedAt,
        SortField::SubmittedAt,
        SortField::SolvedAt,
        SortField::IssueNumber,
        SortField::Location,
        SortField::IssueType,
        SortField::Status,
        SortField::Title,
    ];

    /// Name used in the `sortBy` query parameter (matches the JSON field).
    pub fn param_name(self) -> &'static str {
        match self {
            SortField::CreatedAt => "createdAt",
            SortField::UpdatedAt => "updatedAt",
            SortField::SubmittedAt => "submittedAt",
            SortField::SolvedAt => "solvedAt",
            SortField::IssueNumber => "issueNumber",
            SortField::Location => "location",
            SortField::IssueType => "issueType",
            SortField::Status => "status",
            SortField::Title => "title",
        }
    }

    /// Column name in the `issues` table.
    pub fn column(self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
            SortField::SubmittedAt => "submitted_at",
            SortField::SolvedAt => "solved_at",
            SortField::IssueNumber => "issue_number",
            SortField::Location => "location",
            SortField::IssueType => "issue_type",
            SortField::Status => "status",
            SortField::Title => "title",
        }
    }
}

impl FromStr for SortField {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortField::ALL
            .iter()
            .copied()
            .find(|f| f.param_name() == s)
            .ok_or_else(|| {
                let allowed: Vec<&str> = SortField::ALL.iter().map(|f| f.param_name()).collect();
                CoreError::Validation(format!(
                    "Invalid sortBy '{s}'. Must be one of: {allowed:?}"
                ))
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(CoreError::Validation(format!(
                "Invalid sortOrder '{s}'. Must be 'asc' or 'desc'"
            ))),
        }
    }
}

/// A validated ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub field: SortField,
    pub order: SortOrder,
}

impl Sort {
    /// Default for the main listing.
    pub const NEWEST_CREATED: Sort = Sort {
        field: SortField::CreatedAt,
        order: SortOrder::Desc,
    };

    /// Default for listings by issue number and for exports.
    pub const NEWEST_SUBMITTED: Sort = Sort {
        field: SortField::SubmittedAt,
        order: SortOrder::Desc,
    };

    /// Parse optional `sortBy` / `sortOrder` values, falling back to `default`
    /// for whichever is absent.
    pub fn parse(
        sort_by: Option<&str>,
        sort_order: Option<&str>,
        default: Sort,
    ) -> Result<Self, CoreError> {
        Ok(Self {
            field: sort_by.map(str::parse::<SortField>).transpose()?.unwrap_or(default.field),
            order: sort_order.map(str::parse::<SortOrder>).transpose()?.unwrap_or(default.order),
        })
    }

    /// `ORDER BY` body. Ties are broken by `id` in the same direction so
    /// pagination is stable.
    pub fn order_by_sql(&self) -> String {
        let dir = self.order.sql();
        format!("{} {dir}, id {dir}", self.field.column())
    }
}
