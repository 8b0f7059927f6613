use crate::error::{Error, Result};
use crate::schema::{attendance, students};
use chrono::{NaiveDate, NaiveDateTime};
use diesel::backend::Backend;
use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::prelude::*;
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Text;
use diesel::sqlite::Sqlite;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tabled::Tabled;
use thiserror::Error as ThisError;

/// The only date format accepted from forms and query strings.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses a `YYYY-MM-DD` date, surfacing malformed input as [`Error::InvalidDate`].
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), DATE_FORMAT).map_err(|source| Error::InvalidDate {
        input: input.to_string(),
        source,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable, Serialize, Tabled)]
#[diesel(table_name = students)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Student {
    pub id: i32,
    pub roll_no: String,
    pub name: String,
    pub section: String,
    pub created_at: NaiveDateTime,
}

/// A student about to be inserted, or the new values for an existing student.
///
/// Construct it with [`NewStudent::new`] so that blank fields are rejected before they reach the
/// database.
#[derive(Debug, Insertable, AsChangeset)]
#[diesel(table_name = students)]
pub struct NewStudent<'a> {
    pub roll_no: &'a str,
    pub name: &'a str,
    pub section: &'a str,
}

impl<'a> NewStudent<'a> {
    pub fn new(roll_no: &'a str, name: &'a str, section: &'a str) -> Result<Self> {
        let roll_no = roll_no.trim();
        let name = name.trim();
        let section = section.trim();

        if roll_no.is_empty() {
            return Err(Error::MissingField("roll_no"));
        }
        if name.is_empty() {
            return Err(Error::MissingField("name"));
        }
        if section.is_empty() {
            return Err(Error::MissingField("section"));
        }

        Ok(Self {
            roll_no,
            name,
            section,
        })
    }
}

/// Whether a student attended on a given date.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, AsExpression, FromSqlRow, Serialize, Deserialize,
)]
#[diesel(sql_type = Text)]
pub enum Status {
    Present,
    Absent,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Present => "Present",
            Status::Absent => "Absent",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored status was neither `Present` nor `Absent`.
#[derive(ThisError, Debug, Clone, PartialEq, Eq)]
#[error("unrecognized attendance status `{0}`")]
pub struct ParseStatusError(String);

impl FromStr for Status {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Present" => Ok(Status::Present),
            "Absent" => Ok(Status::Absent),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

impl ToSql<Text, Sqlite> for Status {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Sqlite>) -> serialize::Result {
        out.set_value(self.as_str());
        Ok(IsNull::No)
    }
}

impl FromSql<Text, Sqlite> for Status {
    fn from_sql(bytes: <Sqlite as Backend>::RawValue<'_>) -> deserialize::Result<Self> {
        let text = <String as FromSql<Text, Sqlite>>::from_sql(bytes)?;
        Ok(text.parse()?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable, Associations, Serialize)]
#[diesel(belongs_to(Student))]
#[diesel(table_name = attendance)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Attendance {
    pub id: i32,
    pub student_id: i32,
    pub date: NaiveDate,
    pub status: Status,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = attendance)]
pub struct NewAttendance {
    pub student_id: i32,
    pub date: NaiveDate,
    pub status: Status,
}

/// One attendance record joined with the identity of the student it belongs to.
///
/// This is the row shape shared by the attendance view, the terminal table and the exported
/// spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Tabled)]
pub struct AttendanceRecord {
    pub roll_no: String,
    pub name: String,
    pub section: String,
    pub date: NaiveDate,
    pub status: Status,
}

impl From<(Attendance, Student)> for AttendanceRecord {
    fn from((record, student): (Attendance, Student)) -> Self {
        Self {
            roll_no: student.roll_no,
            name: student.name,
            section: student.section,
            date: record.date,
            status: record.status,
        }
    }
}

/// Narrows the attendance query. `None` means "don't filter on this".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttendanceFilter {
    pub date: Option<NaiveDate>,
    pub section: Option<String>,
}

impl AttendanceFilter {
    /// Builds a filter from raw request parameters, where blank values mean "no filter".
    pub fn parse(date: Option<&str>, section: Option<&str>) -> Result<Self> {
        let date = match date.map(str::trim).filter(|d| !d.is_empty()) {
            Some(date) => Some(parse_date(date)?),
            None => None,
        };
        let section = section
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Ok(Self { date, section })
    }
}

/// The outcome of marking a day's attendance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MarkSummary {
    pub present: usize,
    pub absent: usize,
}

impl MarkSummary {
    pub fn record(&mut self, status: Status) {
        match status {
            Status::Present => self.present += 1,
            Status::Absent => self.absent += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_accepts_iso() {
        let date = parse_date("2025-01-15").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 1, 15).unwrap());
    }

    #[test]
    fn test_parse_date_rejects_other_formats() {
        for input in ["15-01-2025", "2025/01/15", "2025-13-01", "", "today"] {
            assert!(
                matches!(parse_date(input), Err(Error::InvalidDate { .. })),
                "{input:?} should not parse"
            );
        }
    }

    #[test]
    fn test_status_round_trips_through_text() {
        assert_eq!("Present".parse::<Status>(), Ok(Status::Present));
        assert_eq!("Absent".parse::<Status>(), Ok(Status::Absent));
        assert_eq!(
            "present".parse::<Status>().unwrap_err().to_string(),
            "unrecognized attendance status `present`"
        );
        assert_eq!(Status::Absent.to_string(), "Absent");
    }

    #[test]
    fn test_new_student_trims_and_requires_fields() {
        let student = NewStudent::new(" 21CS001 ", "Asha", "A").unwrap();
        assert_eq!(student.roll_no, "21CS001");

        assert!(matches!(
            NewStudent::new("  ", "Asha", "A"),
            Err(Error::MissingField("roll_no"))
        ));
        assert!(matches!(
            NewStudent::new("21CS001", "", "A"),
            Err(Error::MissingField("name"))
        ));
        assert!(matches!(
            NewStudent::new("21CS001", "Asha", " "),
            Err(Error::MissingField("section"))
        ));
    }

    #[test]
    fn test_filter_treats_blank_params_as_absent() {
        let filter = AttendanceFilter::parse(Some(""), Some("  ")).unwrap();
        assert_eq!(filter, AttendanceFilter::default());

        let filter = AttendanceFilter::parse(Some("2025-01-15"), Some("A")).unwrap();
        assert_eq!(filter.date, NaiveDate::from_ymd_opt(2025, 1, 15));
        assert_eq!(filter.section.as_deref(), Some("A"));

        assert!(AttendanceFilter::parse(Some("Jan 15"), None).is_err());
    }

    #[test]
    fn test_mark_summary_counts() {
        let mut summary = MarkSummary::default();
        summary.record(Status::Present);
        summary.record(Status::Absent);
        summary.record(Status::Absent);
        assert_eq!(
            summary,
            MarkSummary {
                present: 1,
                absent: 2
            }
        );
    }
}
