//! The HTTP front end: thin axum handlers over [`AttendanceManager`].
//!
//! Views are JSON documents. Form submissions answer with a `303 See Other` redirect whose query
//! string carries a one-shot `notice`, which the target view echoes back.

mod attendance;
mod error;
mod roster;

use axum::extract::{Query, State};
use axum::response::Redirect;
use axum::{Json, Router};
use axum::routing::{get, post};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::{Error, Result};
use crate::manager::AttendanceManager;

/// State shared by every handler.
pub struct AppState {
    manager: Mutex<AttendanceManager>,
    export_dir: PathBuf,
}

impl AppState {
    pub fn new(manager: AttendanceManager, export_dir: impl Into<PathBuf>) -> Arc<Self> {
        Arc::new(Self {
            manager: Mutex::new(manager),
            export_dir: export_dir.into(),
        })
    }

    /// Locks the storage context for the duration of one request.
    ///
    /// The guard must be dropped before the handler awaits anything.
    fn manager(&self) -> Result<MutexGuard<'_, AttendanceManager>> {
        self.manager
            .lock()
            .map_err(|_| Error::internal("attendance manager lock poisoned"))
    }
}

/// The optional `?notice=` left by a redirect.
#[derive(Debug, Default, Deserialize)]
pub struct NoticeQuery {
    pub notice: Option<String>,
}

#[derive(Debug, Serialize)]
struct IndexView {
    students: usize,
    records: usize,
    notice: Option<String>,
}

/// Redirects to `path` with `notice` attached as a query parameter.
fn redirect_with_notice(path: &str, notice: &str) -> Redirect {
    Redirect::to(&format!("{path}?notice={}", urlencoding::encode(notice)))
}

/// Builds the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/students", get(roster::list_students))
        .route("/add_student", post(roster::add_student))
        .route(
            "/edit_student/{id}",
            get(roster::show_student).post(roster::edit_student),
        )
        .route("/delete_student/{id}", post(roster::delete_student))
        .route("/attendance", get(attendance::marking_form))
        .route("/mark_attendance", post(attendance::mark_attendance))
        .route("/view_attendance", get(attendance::view_attendance))
        .route("/export_excel", get(attendance::export_excel))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves the application on `bind_addr` until the process is stopped.
pub async fn serve(state: Arc<AppState>, bind_addr: &str) -> Result<()> {
    let listener = TcpListener::bind(bind_addr).await?;
    info!("listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn index(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NoticeQuery>,
) -> Result<Json<IndexView>> {
    let mut manager = state.manager()?;

    Ok(Json(IndexView {
        students: manager.num_students()?,
        records: manager.num_records()?,
        notice: query.notice,
    }))
}
