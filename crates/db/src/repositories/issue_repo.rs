//! Repository for the `issues` table.

use fixit_core::issue::IssueStatus;
use fixit_core::listing::{PageRequest, Sort};
use fixit_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::issue::{Issue, IssueChanges, IssueFilter, NewIssue};

/// Column list for `issues` queries.
const COLUMNS: &str = "\
    id, issue_number, title, description, location, issue_type, status, \
    submitted_at, solved_at, created_at, updated_at";

/// Bind the parameters of [`where_clause`] in the same order it numbered them.
macro_rules! bind_filter {
    ($query:expr, $filter:expr) => {{
        let mut q = $query;
        if let Some(status) = $filter.status {
            q = q.bind(status.as_str());
        }
        if let Some(number) = $filter.issue_number.as_deref() {
            q = q.bind(number);
        }
        if let Some(start) = $filter.submitted.start {
            q = q.bind(start);
        }
        if let Some(end) = $filter.submitted.end {
            q = q.bind(end);
        }
        q
    }};
}

/// Build a `WHERE` clause for `filter`, numbering placeholders from 1.
///
/// `extra` conditions (which must not take parameters) are ANDed in.
/// Returns the clause (possibly empty) and the next free placeholder index.
fn where_clause(filter: &IssueFilter, extra: &[&str]) -> (String, usize) {
    let mut conditions: Vec<String> = Vec::new();
    let mut param_idx: usize = 1;

    if filter.status.is_some() {
        conditions.push(format!("status = ${param_idx}"));
        param_idx += 1;
    }
    if filter.issue_number.is_some() {
        conditions.push(format!("issue_number = ${param_idx}"));
        param_idx += 1;
    }
    if filter.submitted.start.is_some() {
        conditions.push(format!("submitted_at >= ${param_idx}"));
        param_idx += 1;
    }
    if filter.submitted.end.is_some() {
        conditions.push(format!("submitted_at <= ${param_idx}"));
        param_idx += 1;
    }
    conditions.extend(extra.iter().map(|c| c.to_string()));

    let clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };
    (clause, param_idx)
}

/// Provides CRUD and aggregate operations for issues.
pub struct IssueRepo;

impl IssueRepo {
    /// Insert a new issue, returning the full row. `status` defaults to
    /// OPEN and `submitted_at` to now.
    pub async fn create(pool: &PgPool, input: &NewIssue) -> Result<Issue, sqlx::Error> {
        let query = format!(
            "INSERT INTO issues (issue_number, title, description, location, issue_type) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Issue>(&query)
            .bind(&input.issue_number)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.location)
            .bind(input.issue_type.as_str())
            .fetch_one(pool)
            .await
    }

    /// Find an issue by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Issue>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM issues WHERE id = $1");
        sqlx::query_as::<_, Issue>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// One page of issues matching `filter`, in `sort` order.
    pub async fn list_page(
        pool: &PgPool,
        filter: &IssueFilter,
        sort: Sort,
        page: PageRequest,
    ) -> Result<Vec<Issue>, sqlx::Error> {
        let (where_sql, param_idx) = where_clause(filter, &[]);
        let query = format!(
            "SELECT {COLUMNS} FROM issues {where_sql} \
             ORDER BY {} \
             LIMIT ${param_idx} OFFSET ${}",
            sort.order_by_sql(),
            param_idx + 1
        );

        bind_filter!(sqlx::query_as::<_, Issue>(&query), filter)
            .bind(page.limit)
            .bind(page.offset())
            .fetch_all(pool)
            .await
    }

    /// Every issue matching `filter`, in `sort` order.
    pub async fn list_all(
        pool: &PgPool,
        filter: &IssueFilter,
        sort: Sort,
    ) -> Result<Vec<Issue>, sqlx::Error> {
        let (where_sql, _) = where_clause(filter, &[]);
        let query = format!(
            "SELECT {COLUMNS} FROM issues {where_sql} ORDER BY {}",
            sort.order_by_sql()
        );

        bind_filter!(sqlx::query_as::<_, Issue>(&query), filter)
            .fetch_all(pool)
            .await
    }

    /// Number of issues matching `filter`.
    pub async fn count(pool: &PgPool, filter: &IssueFilter) -> Result<i64, sqlx::Error> {
        let (where_sql, _) = where_clause(filter, &[]);
        let query = format!("SELECT COUNT(*) FROM issues {where_sql}");

        bind_filter!(sqlx::query_scalar::<_, i64>(&query), filter)
            .fetch_one(pool)
            .await
    }

    /// Number of distinct `issue_number` values among issues matching `filter`.
    pub async fn count_distinct_numbers(
        pool: &PgPool,
        filter: &IssueFilter,
    ) -> Result<i64, sqlx::Error> {
        let (where_sql, _) = where_clause(filter, &[]);
        let query = format!("SELECT COUNT(DISTINCT issue_number) FROM issues {where_sql}");

        bind_filter!(sqlx::query_scalar::<_, i64>(&query), filter)
            .fetch_one(pool)
            .await
    }

    /// `(submitted_at, solved_at)` of every SOLVED issue with a solve time
    /// that matches `filter`. The filter's own status is overridden.
    pub async fn solve_times(
        pool: &PgPool,
        filter: &IssueFilter,
    ) -> Result<Vec<(Timestamp, Timestamp)>, sqlx::Error> {
        let filter = IssueFilter {
            status: Some(IssueStatus::Solved),
            ..filter.clone()
        };
        let (where_sql, _) = where_clause(&filter, &["solved_at IS NOT NULL"]);
        let query = format!("SELECT submitted_at, solved_at FROM issues {where_sql}");

        bind_filter!(sqlx::query_as::<_, (Timestamp, Timestamp)>(&query), filter)
            .fetch_all(pool)
            .await
    }

    /// Number of issues with `start <= submitted_at < end`.
    pub async fn count_submitted_between(
        pool: &PgPool,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM issues WHERE submitted_at >= $1 AND submitted_at < $2",
        )
        .bind(start)
        .bind(end)
        .fetch_one(pool)
        .await
    }

    /// Apply `changes` in one statement. Returns the updated row if found.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        changes: &IssueChanges,
    ) -> Result<Option<Issue>, sqlx::Error> {
        let query = format!(
            "UPDATE issues SET
                title = CASE WHEN $2 THEN $3 ELSE title END,
                description = CASE WHEN $4 THEN $5 ELSE description END,
                location = COALESCE($6, location),
                issue_type = COALESCE($7, issue_type),
                status = COALESCE($8, status),
                submitted_at = COALESCE($9, submitted_at),
                solved_at = CASE WHEN $10 THEN $11 ELSE solved_at END,
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let timeline = &changes.timeline;
        sqlx::query_as::<_, Issue>(&query)
            .bind(id)
            .bind(changes.title.is_some())
            .bind(changes.title.clone().flatten())
            .bind(changes.description.is_some())
            .bind(changes.description.clone().flatten())
            .bind(changes.location.as_deref())
            .bind(changes.issue_type.map(|t| t.as_str()))
            .bind(timeline.status.map(|s| s.as_str()))
            .bind(timeline.submitted_at)
            .bind(timeline.solved_at.is_some())
            .bind(timeline.solved_at.flatten())
            .fetch_optional(pool)
            .await
    }

    /// Delete an issue by ID. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM issues WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
