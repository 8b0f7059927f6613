//! Exporting attendance records to an Excel workbook.

use chrono::{Local, NaiveDateTime};
use rust_xlsxwriter::Workbook;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::Result;
use crate::models::{AttendanceRecord, DATE_FORMAT};
use crate::paths;

/// Name of the single worksheet in every report.
pub const SHEET_NAME: &str = "Attendance Report";

/// Column headers, in the order each record is flattened.
pub const HEADERS: [&str; 5] = ["Roll No", "Name", "Section", "Date", "Status"];

/// Directory under the system temp dir used when the configured export directory is unusable.
const FALLBACK_DIR_NAME: &str = "exports";

/// MIME type of an `.xlsx` workbook.
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// A report that has been written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedReport {
    pub path: PathBuf,
    pub filename: String,
    pub rows: usize,
}

/// The download name for a report generated at `at`, e.g. `attendance_report_20250115_093000.xlsx`.
pub fn report_filename(at: NaiveDateTime) -> String {
    format!("attendance_report_{}.xlsx", at.format("%Y%m%d_%H%M%S"))
}

/// Flattens a record into the five report columns.
pub fn flatten(record: &AttendanceRecord) -> [String; 5] {
    [
        record.roll_no.clone(),
        record.name.clone(),
        record.section.clone(),
        record.date.format(DATE_FORMAT).to_string(),
        record.status.to_string(),
    ]
}

/// Writes `records` to a single-sheet workbook at `path`: one header row, then one row per record.
pub fn write_report(records: &[AttendanceRecord], path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    for (col, header) in HEADERS.iter().enumerate() {
        worksheet.write_string(0, col as u16, *header)?;
    }

    for (row, record) in records.iter().enumerate() {
        for (col, value) in flatten(record).iter().enumerate() {
            worksheet.write_string(row as u32 + 1, col as u16, value.as_str())?;
        }
    }

    workbook.save(path)?;
    Ok(())
}

/// Writes `records` to a timestamped workbook in `preferred_dir`, or in the temp directory if
/// `preferred_dir` cannot be written to.
pub fn export_report(records: &[AttendanceRecord], preferred_dir: &Path) -> Result<ExportedReport> {
    let dir = paths::writable_dir_or_temp(preferred_dir, FALLBACK_DIR_NAME)?;
    let filename = report_filename(Local::now().naive_local());
    let path = dir.join(&filename);

    write_report(records, &path)?;
    info!(path = %path.display(), rows = records.len(), "exported attendance report");

    Ok(ExportedReport {
        path,
        filename,
        rows: records.len(),
    })
}
