use anyhow::Result;
use attendance::AttendanceManager;
use attendance::web::{self, AppState};
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use serde_json::Value;
use tower::util::ServiceExt;

/// A router over an empty roster. The export directory lives as long as the returned guard.
fn test_router() -> (Router, tempfile::TempDir) {
    let manager = AttendanceManager::in_memory().unwrap();
    let exports = tempfile::tempdir().unwrap();
    let router = web::router(AppState::new(manager, exports.path()));
    (router, exports)
}

fn form_post(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn json(response: Response) -> Result<Value> {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&body)?)
}

async fn roster(router: &Router) -> Result<Vec<Value>> {
    let response = router.clone().oneshot(get("/students")).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json(response).await?;
    Ok(body["students"].as_array().cloned().unwrap_or_default())
}

#[tokio::test]
async fn test_add_student_redirects_with_notice() -> Result<()> {
    let (router, _exports) = test_router();

    let response = router
        .clone()
        .oneshot(form_post(
            "/add_student",
            "roll_no=21CS001&name=Asha+Rao&section=A",
        ))
        .await?;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response.headers()[header::LOCATION].to_str()?.to_string();
    assert!(location.starts_with("/students?notice="));

    let response = router.clone().oneshot(get(&location)).await?;
    let body = json(response).await?;
    assert_eq!(body["notice"], "Student added successfully!");
    assert_eq!(body["students"][0]["roll_no"], "21CS001");
    assert_eq!(body["students"][0]["name"], "Asha Rao");
    assert_eq!(body["students"][0]["section"], "A");

    Ok(())
}

#[tokio::test]
async fn test_duplicate_roll_number_is_rejected() -> Result<()> {
    let (router, _exports) = test_router();
    router
        .clone()
        .oneshot(form_post("/add_student", "roll_no=01&name=Asha&section=A"))
        .await?;

    let response = router
        .clone()
        .oneshot(form_post("/add_student", "roll_no=01&name=Other&section=B"))
        .await?;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = json(response).await?;
    assert_eq!(body["error"], "Student with this roll number already exists!");

    let students = roster(&router).await?;
    assert_eq!(students.len(), 1);
    assert_eq!(students[0]["name"], "Asha");

    Ok(())
}

#[tokio::test]
async fn test_blank_field_is_a_bad_request() -> Result<()> {
    let (router, _exports) = test_router();

    let response = router
        .clone()
        .oneshot(form_post("/add_student", "roll_no=&name=Asha&section=A"))
        .await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(roster(&router).await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_edit_student() -> Result<()> {
    let (router, _exports) = test_router();
    router
        .clone()
        .oneshot(form_post("/add_student", "roll_no=01&name=Asha&section=A"))
        .await?;
    router
        .clone()
        .oneshot(form_post("/add_student", "roll_no=02&name=Bilal&section=A"))
        .await?;
    let asha_id = roster(&router).await?[0]["id"].as_i64().unwrap();

    // Same roll number, new section: allowed.
    let response = router
        .clone()
        .oneshot(form_post(
            &format!("/edit_student/{asha_id}"),
            "roll_no=01&name=Asha&section=C",
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    // Bilal's roll number: rejected.
    let response = router
        .clone()
        .oneshot(form_post(
            &format!("/edit_student/{asha_id}"),
            "roll_no=02&name=Asha&section=C",
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = router
        .clone()
        .oneshot(get(&format!("/edit_student/{asha_id}")))
        .await?;
    let student = json(response).await?;
    assert_eq!(student["roll_no"], "01");
    assert_eq!(student["section"], "C");

    Ok(())
}

#[tokio::test]
async fn test_unknown_student_is_not_found() -> Result<()> {
    let (router, _exports) = test_router();

    let response = router.clone().oneshot(get("/edit_student/99")).await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = router
        .clone()
        .oneshot(form_post(
            "/edit_student/99",
            "roll_no=01&name=Asha&section=A",
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = router
        .clone()
        .oneshot(form_post("/delete_student/99", ""))
        .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn test_delete_student() -> Result<()> {
    let (router, _exports) = test_router();
    router
        .clone()
        .oneshot(form_post("/add_student", "roll_no=01&name=Asha&section=A"))
        .await?;
    let asha_id = roster(&router).await?[0]["id"].as_i64().unwrap();

    let response = router
        .clone()
        .oneshot(form_post(&format!("/delete_student/{asha_id}"), ""))
        .await?;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(roster(&router).await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_missing_field_is_a_bad_request() -> Result<()> {
    let (router, _exports) = test_router();

    let response = router
        .clone()
        .oneshot(form_post("/add_student", "name=Asha&section=A"))
        .await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json(response).await?;
    assert_eq!(body["error"], "roll_no is required");
    assert!(roster(&router).await?.is_empty());

    Ok(())
}
