use axum::Json;
use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::Form;
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::warn;

use super::{AppState, NoticeQuery, redirect_with_notice};
use crate::error::Result;
use crate::models::{AttendanceFilter, AttendanceRecord, Student, parse_date};
use crate::report::{self, XLSX_CONTENT_TYPE};

#[derive(Debug, Serialize)]
pub struct MarkingForm {
    date: NaiveDate,
    students: Vec<Student>,
    notice: Option<String>,
}

/// The attendance form: a date plus one `attendance` value per student ticked present.
///
/// A missing date decodes as blank and is rejected by [`parse_date`].
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MarkAttendanceForm {
    pub date: String,
    pub attendance: Vec<String>,
}

impl MarkAttendanceForm {
    /// The submitted student IDs. Values that are not IDs can never match a student, so they are
    /// dropped.
    fn present_ids(&self) -> HashSet<i32> {
        self.attendance
            .iter()
            .filter_map(|value| match value.trim().parse() {
                Ok(id) => Some(id),
                Err(_) => {
                    warn!(value = %value, "ignoring non-numeric student id");
                    None
                }
            })
            .collect()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ViewQuery {
    pub date: Option<String>,
    pub section: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AttendanceView {
    records: Vec<AttendanceRecord>,
    dates: Vec<NaiveDate>,
    sections: Vec<String>,
}

pub async fn marking_form(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NoticeQuery>,
) -> Result<Json<MarkingForm>> {
    let students = state.manager()?.get_roster()?;

    Ok(Json(MarkingForm {
        date: Local::now().date_naive(),
        students,
        notice: query.notice,
    }))
}

pub async fn mark_attendance(
    State(state): State<Arc<AppState>>,
    Form(form): Form<MarkAttendanceForm>,
) -> Result<Redirect> {
    let date = parse_date(&form.date)?;
    state
        .manager()?
        .mark_attendance(date, &form.present_ids())?;

    Ok(redirect_with_notice(
        "/attendance",
        "Attendance marked successfully!",
    ))
}

pub async fn view_attendance(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ViewQuery>,
) -> Result<Json<AttendanceView>> {
    let filter = AttendanceFilter::parse(query.date.as_deref(), query.section.as_deref())?;

    let mut manager = state.manager()?;
    Ok(Json(AttendanceView {
        records: manager.get_attendance(&filter)?,
        dates: manager.attendance_dates()?,
        sections: manager.sections()?,
    }))
}

pub async fn export_excel(State(state): State<Arc<AppState>>) -> Result<Response> {
    let exported = {
        let mut manager = state.manager()?;
        let records = manager.get_attendance(&AttendanceFilter::default())?;
        report::export_report(&records, &state.export_dir)?
    };

    let contents = tokio::fs::read(&exported.path).await?;
    let disposition = format!("attachment; filename=\"{}\"", exported.filename);

    Ok((
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Body::from(contents),
    )
        .into_response())
}
