//! Spreadsheet export of issue lists.
//!
//! [`ExportRow::from_record`] flattens an issue into display strings and
//! [`build_workbook`] serializes rows into a single-sheet XLSX document.
//! Row selection and ordering are the caller's job.

use std::fmt::Display;

use chrono::{DateTime, TimeZone};
use rust_xlsxwriter::{Format, Workbook, XlsxError};

use crate::duration::{elapsed_millis, format_duration};
use crate::error::CoreError;
use crate::issue::{IssueStatus, IssueType};
use crate::types::Timestamp;

/// Name of the only worksheet in the export.
pub const SHEET_NAME: &str = "Issues";

/// MIME type of the produced document.
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Header text and column width (in characters), in output order.
pub const COLUMNS: &[(&str, f64)] = &[
    ("Issue Number", 15.0),
    ("Location", 25.0),
    ("Issue Type", 15.0),
    ("Title", 25.0),
    ("Description", 40.0),
    ("Status", 10.0),
    ("Submitted At", 20.0),
    ("Solved At", 20.0),
    ("Time to Solve", 20.0),
];

const DISPLAY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The fields of an issue that appear in the export.
#[derive(Debug, Clone, Copy)]
pub struct ExportRecord<'a> {
    pub issue_number: &'a str,
    pub location: &'a str,
    pub issue_type: IssueType,
    pub title: Option<&'a str>,
    pub description: Option<&'a str>,
    pub status: IssueStatus,
    pub submitted_at: Timestamp,
    pub solved_at: Option<Timestamp>,
}

/// One spreadsheet row, already rendered to text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRow {
    pub issue_number: String,
    pub location: String,
    pub issue_type: String,
    pub title: String,
    pub description: String,
    pub status: String,
    pub submitted_at: String,
    pub solved_at: String,
    pub time_to_solve: String,
}

impl ExportRow {
    /// Render `record`, formatting timestamps in `tz`.
    ///
    /// `time_to_solve` is only filled for SOLVED issues that carry a solve time.
    pub fn from_record<Tz>(record: &ExportRecord<'_>, tz: &Tz) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let time_to_solve = match (record.status, record.solved_at) {
            (IssueStatus::Solved, Some(solved_at)) => {
                format_duration(elapsed_millis(record.submitted_at, solved_at))
            }
            _ => String::new(),
        };

        Self {
            issue_number: record.issue_number.to_string(),
            location: record.location.to_string(),
            issue_type: record.issue_type.to_string(),
            title: record.title.unwrap_or_default().to_string(),
            description: record.description.unwrap_or_default().to_string(),
            status: record.status.to_string(),
            submitted_at: display_time(record.submitted_at, tz),
            solved_at: record
                .solved_at
                .map(|t| display_time(t, tz))
                .unwrap_or_default(),
            time_to_solve,
        }
    }

    fn cells(&self) -> [&str; 9] {
        [
            self.issue_number.as_str(),
            self.location.as_str(),
            self.issue_type.as_str(),
            self.title.as_str(),
            self.description.as_str(),
            self.status.as_str(),
            self.submitted_at.as_str(),
            self.solved_at.as_str(),
            self.time_to_solve.as_str(),
        ]
    }
}

/// Serialize rows into an XLSX document with a header row and width hints.
pub fn build_workbook(rows: &[ExportRow]) -> Result<Vec<u8>, CoreError> {
    write_workbook(rows).map_err(|e| CoreError::Internal(format!("XLSX generation failed: {e}")))
}

fn write_workbook(rows: &[ExportRow]) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();

    {
        let sheet = workbook.add_worksheet();
        sheet.set_name(SHEET_NAME)?;

        for (col, (title, width)) in COLUMNS.iter().enumerate() {
            let col = col as u16;
            sheet.set_column_width(col, *width)?;
            sheet.write_string_with_format(0, col, *title, &header)?;
        }

        for (idx, row) in rows.iter().enumerate() {
            let row_num = idx as u32 + 1;
            for (col, value) in row.cells().iter().enumerate() {
                sheet.write_string(row_num, col as u16, *value)?;
            }
        }
    }

    workbook.save_to_buffer()
}

/// Download filename: `issues-export-<date>-<time>.xlsx`, with the time's
/// colons replaced so it is safe on every filesystem.
pub fn export_filename<Tz>(now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let date = now.format("%Y-%m-%d");
    let time = now.format("%H:%M:%S").to_string().replace(':', "-");
    format!("issues-export-{date}-{time}.xlsx")
}

fn display_time<Tz>(ts: Timestamp, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    ts.with_timezone(tz).format(DISPLAY_TIME_FORMAT).to_string()
}
