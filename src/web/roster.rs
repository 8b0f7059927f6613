use axum::Json;
use axum::extract::{Form, Path, Query, State};
use axum::response::Redirect;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{AppState, NoticeQuery, redirect_with_notice};
use crate::error::Result;
use crate::models::{NewStudent, Student};

/// Missing fields decode as blank and are rejected by [`NewStudent::new`].
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StudentForm {
    pub roll_no: String,
    pub name: String,
    pub section: String,
}

impl StudentForm {
    fn as_new_student(&self) -> Result<NewStudent<'_>> {
        NewStudent::new(&self.roll_no, &self.name, &self.section)
    }
}

#[derive(Debug, Serialize)]
pub struct RosterView {
    students: Vec<Student>,
    notice: Option<String>,
}

pub async fn list_students(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NoticeQuery>,
) -> Result<Json<RosterView>> {
    let students = state.manager()?.get_roster()?;

    Ok(Json(RosterView {
        students,
        notice: query.notice,
    }))
}

pub async fn add_student(
    State(state): State<Arc<AppState>>,
    Form(form): Form<StudentForm>,
) -> Result<Redirect> {
    let new_student = form.as_new_student()?;
    state.manager()?.add_student(&new_student)?;

    Ok(redirect_with_notice("/students", "Student added successfully!"))
}

pub async fn show_student(
    State(state): State<Arc<AppState>>,
    Path(student_id): Path<i32>,
) -> Result<Json<Student>> {
    Ok(Json(state.manager()?.get_student(student_id)?))
}

pub async fn edit_student(
    State(state): State<Arc<AppState>>,
    Path(student_id): Path<i32>,
    Form(form): Form<StudentForm>,
) -> Result<Redirect> {
    let changes = form.as_new_student()?;
    state.manager()?.update_student(student_id, &changes)?;

    Ok(redirect_with_notice("/students", "Student updated successfully!"))
}

pub async fn delete_student(
    State(state): State<Arc<AppState>>,
    Path(student_id): Path<i32>,
) -> Result<Redirect> {
    state.manager()?.delete_student(student_id)?;

    Ok(redirect_with_notice("/students", "Student deleted successfully!"))
}
