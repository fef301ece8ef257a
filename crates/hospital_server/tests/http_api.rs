//! HTTP-level tests for the hospital records API.
//!
//! Drive the full router (auth middleware, handlers, error mapping) against
//! the in-memory store, so no database is needed.

use std::sync::Arc;

use axum::body::Body;
use http_body_util::BodyExt;
use hospital_core::{HospitalService, ServiceSettings};
use hospital_server::router::build_router;
use hospital_server::startup::memory_service;
use hyper::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

// ── Test app builder ───────────────────────────────────────────

fn build_test_app() -> axum::Router {
    build_app_with(ServiceSettings::default())
}

fn build_app_with(settings: ServiceSettings) -> axum::Router {
    let service: Arc<dyn HospitalService> = Arc::new(memory_service().with_settings(settings));
    build_router(service)
}

async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let req = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(
            |_| json!({ "raw": String::from_utf8_lossy(&bytes).to_string() }),
        )
    };
    (status, json)
}

/// Register and return `(token, id)`.
async fn register(app: &axum::Router, username: &str, group: &str) -> (String, i64) {
    let (status, body) = send(
        app,
        "POST",
        "/register/",
        None,
        Some(json!({ "username": username, "password": "pw-123", "group": group })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register {username}: {body}");
    let token = body["token"].as_str().unwrap().to_string();
    let id = find_id(app, &token, username, group).await;
    (token, id)
}

/// Registration does not return the id; every account may read its own
/// detail endpoint, so probe for it.
async fn find_id(app: &axum::Router, token: &str, username: &str, group: &str) -> i64 {
    let resource = if group.eq_ignore_ascii_case("doctor") {
        "doctors"
    } else {
        "patients"
    };
    // Ids are small sequential integers in the in-memory store.
    for id in 1..=64 {
        let (status, body) = send(app, "GET", &format!("/{resource}/{id}/"), Some(token), None).await;
        if status == StatusCode::OK && body["username"] == username {
            return id;
        }
    }
    panic!("could not resolve id for {username}");
}

async fn create_department(app: &axum::Router, token: &str, name: &str) -> i64 {
    let (status, body) = send(
        app,
        "POST",
        "/departments/",
        Some(token),
        Some(json!({
            "name": name,
            "diagnostics": "General",
            "location": "Block A",
            "specialization": name,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_i64().unwrap()
}

async fn join_department(app: &axum::Router, token: &str, department: i64, doctors: &[i64]) {
    let (status, body) = send(
        app,
        "PUT",
        &format!("/department/{department}/doctors/"),
        Some(token),
        Some(json!({ "doctors": doctors })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
}

async fn create_record(app: &axum::Router, token: &str, patient: i64, department: i64) -> i64 {
    let (status, body) = send(
        app,
        "POST",
        "/patient_records/",
        Some(token),
        Some(json!({
            "patient": patient,
            "department": department,
            "diagnostics": "Flu",
            "observations": "Fever",
            "treatments": "Rest",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["record_id"].as_i64().unwrap()
}

/// A doctor in one department, a second doctor elsewhere, and a patient with
/// one record in the first department.
struct Ward {
    app: axum::Router,
    doctor: String,
    doctor_id: i64,
    outsider: String,
    patient: String,
    patient_id: i64,
    department: i64,
    record: i64,
}

async fn ward() -> Ward {
    let app = build_test_app();
    let (doctor, doctor_id) = register(&app, "dr_house", "doctor").await;
    let (outsider, outsider_id) = register(&app, "dr_wilson", "Doctor").await;
    let (patient, patient_id) = register(&app, "john", "patient").await;

    let department = create_department(&app, &doctor, "Diagnostics").await;
    let oncology = create_department(&app, &doctor, "Oncology").await;
    join_department(&app, &doctor, department, &[doctor_id]).await;
    join_department(&app, &doctor, oncology, &[outsider_id]).await;
    let record = create_record(&app, &doctor, patient_id, department).await;

    Ward {
        app,
        doctor,
        doctor_id,
        outsider,
        patient,
        patient_id,
        department,
        record,
    }
}

// ── Health / auth ──────────────────────────────────────────────

#[tokio::test]
async fn health_needs_no_auth() {
    let app = build_test_app();
    let (status, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn protected_routes_require_token() {
    let app = build_test_app();
    let (status, body) = send(&app, "GET", "/patient_records/", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Authentication credentials were not provided.");

    let (status, body) = send(&app, "GET", "/doctors/", Some("deadbeef"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Invalid token.");
}

#[tokio::test]
async fn token_scheme_is_accepted() {
    let app = build_test_app();
    let (token, _) = register(&app, "dr_token", "doctor").await;
    let req = Request::builder()
        .uri("/doctors/")
        .header("authorization", format!("Token {token}"))
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

// ── Registration / login / logout ─────────────────────────────

#[tokio::test]
async fn registered_doctor_lists_themself() {
    let app = build_test_app();
    let (token, _) = register(&app, "a1", "doctor").await;
    let (status, body) = send(&app, "GET", "/doctors/", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["username"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["a1"]);
}

#[tokio::test]
async fn register_echoes_group_and_rejects_duplicates() {
    let app = build_test_app();
    let (status, body) = send(
        &app,
        "POST",
        "/register/",
        None,
        Some(json!({ "username": "a1", "password": "p", "group": "Patient" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["username"], "a1");
    assert_eq!(body["group"], "Patient");
    assert_eq!(body["token"].as_str().unwrap().len(), 40);

    let (status, body) = send(
        &app,
        "POST",
        "/register/",
        None,
        Some(json!({ "username": "a1", "password": "q", "group": "doctor" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Username already taken.");

    // The original a1 survives unchanged: old password, still a patient.
    let (status, body) = send(
        &app,
        "POST",
        "/login/",
        None,
        Some(json!({ "username": "a1", "password": "p" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap().to_string();
    let (status, _) = send(&app, "GET", "/doctors/", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn register_with_unknown_group_creates_nothing() {
    let app = build_test_app();
    let (status, body) = send(
        &app,
        "POST",
        "/register/",
        None,
        Some(json!({ "username": "n1", "password": "p", "group": "nurse" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["detail"],
        "Invalid group. Please choose either Doctor or Patient."
    );

    let (status, _) = send(
        &app,
        "POST",
        "/login/",
        None,
        Some(json!({ "username": "n1", "password": "p" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn register_requires_all_fields() {
    let app = build_test_app();
    let (status, body) = send(
        &app,
        "POST",
        "/register/",
        None,
        Some(json!({ "username": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Please provide username, password, and group.");
}

#[tokio::test]
async fn malformed_json_is_a_detail_error() {
    let app = build_test_app();
    let req = Request::builder()
        .method("POST")
        .uri("/register/")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn login_then_logout_twice() {
    let app = build_test_app();
    register(&app, "p1", "patient").await;

    let (status, body) = send(
        &app,
        "POST",
        "/login/",
        None,
        Some(json!({ "username": "p1", "password": "pw-123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["expires"].is_string());
    let token = body["token"].as_str().unwrap().to_string();

    let (status, body) = send(&app, "POST", "/logout/", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["detail"], "Successfully logged out.");

    let (status, body) = send(&app, "POST", "/logout/", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Token not found or already expired.");

    // A revoked token no longer authenticates.
    let (status, _) = send(&app, "GET", "/patient_records/", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_without_header_is_401() {
    let app = build_test_app();
    let (status, _) = send(&app, "POST", "/logout/", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn wrong_password_is_rejected() {
    let app = build_test_app();
    register(&app, "p2", "patient").await;
    let (status, body) = send(
        &app,
        "POST",
        "/login/",
        None,
        Some(json!({ "username": "p2", "password": "nope" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Unable to log in with provided credentials.");
}

// ── Patient records ────────────────────────────────────────────

#[tokio::test]
async fn patient_sees_only_own_records() {
    let w = ward().await;
    let (other, other_id) = register(&w.app, "jane", "patient").await;
    create_record(&w.app, &w.doctor, other_id, w.department).await;

    let (status, body) = send(&w.app, "GET", "/patient_records/", Some(&w.patient), None).await;
    assert_eq!(status, StatusCode::OK);
    let records = body.as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["patient_id"], w.patient_id);
    assert_eq!(records[0]["record_id"], w.record);

    let (_, body) = send(&w.app, "GET", "/patient_records/", Some(&other), None).await;
    assert!(body
        .as_array()
        .unwrap()
        .iter()
        .all(|r| r["patient_id"] == other_id));
}

#[tokio::test]
async fn doctor_sees_only_department_records() {
    let w = ward().await;
    let (status, body) = send(&w.app, "GET", "/patient_records/", Some(&w.doctor), None).await;
    assert_eq!(status, StatusCode::OK);
    let records = body.as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["department_id"], w.department);

    let (_, body) = send(&w.app, "GET", "/patient_records/", Some(&w.outsider), None).await;
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn record_detail_names_patient_and_department() {
    let w = ward().await;
    let uri = format!("/patient_records/{}/", w.record);
    let (status, body) = send(&w.app, "GET", &uri, Some(&w.patient), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["patient"], "john");
    assert_eq!(body["department"], "Diagnostics");
    assert_eq!(body["diagnostics"], "Flu");
    assert!(body["created_date"].is_string());
}

#[tokio::test]
async fn outside_doctor_cannot_update() {
    let w = ward().await;
    let uri = format!("/patient_records/{}/", w.record);
    let (status, body) = send(
        &w.app,
        "PUT",
        &uri,
        Some(&w.outsider),
        Some(json!({ "diagnostics": "X" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["detail"], "Not authorized");
}

#[tokio::test]
async fn patient_cannot_update_own_record() {
    let w = ward().await;
    let uri = format!("/patient_records/{}/", w.record);
    let (status, _) = send(
        &w.app,
        "PUT",
        &uri,
        Some(&w.patient),
        Some(json!({ "diagnostics": "Healthy" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(&w.app, "DELETE", &uri, Some(&w.patient), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn partial_update_keeps_other_fields() {
    let w = ward().await;
    let uri = format!("/patient_records/{}/", w.record);
    let (status, body) = send(
        &w.app,
        "PUT",
        &uri,
        Some(&w.doctor),
        Some(json!({ "diagnostics": "X" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["detail"], "Record updated");

    let (_, body) = send(&w.app, "GET", &uri, Some(&w.doctor), None).await;
    assert_eq!(body["diagnostics"], "X");
    assert_eq!(body["observations"], "Fever");
    assert_eq!(body["treatments"], "Rest");
}

#[tokio::test]
async fn department_doctor_deletes_record() {
    let w = ward().await;
    let uri = format!("/patient_records/{}/", w.record);
    let (status, body) = send(&w.app, "DELETE", &uri, Some(&w.doctor), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());

    let (status, body) = send(&w.app, "GET", &uri, Some(&w.doctor), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Record not found");
}

#[tokio::test]
async fn record_creation_validates_references() {
    let w = ward().await;
    let (status, _) = send(
        &w.app,
        "POST",
        "/patient_records/",
        Some(&w.doctor),
        Some(json!({
            "patient": w.doctor_id,
            "department": w.department,
            "diagnostics": "d",
            "observations": "o",
            "treatments": "t",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &w.app,
        "POST",
        "/patient_records/",
        Some(&w.doctor),
        Some(json!({
            "patient": w.patient_id,
            "department": 999,
            "diagnostics": "d",
            "observations": "o",
            "treatments": "t",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &w.app,
        "POST",
        "/patient_records/",
        Some(&w.patient),
        Some(json!({
            "patient": w.patient_id,
            "department": w.department,
            "diagnostics": "d",
            "observations": "o",
            "treatments": "t",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_or_unparseable_record_id_is_404() {
    let w = ward().await;
    let (status, _) = send(&w.app, "GET", "/patient_records/9999/", Some(&w.doctor), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, body) = send(&w.app, "GET", "/patient_records/abc/", Some(&w.doctor), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["detail"].is_string());
}

// ── Doctors / patients ─────────────────────────────────────────

#[tokio::test]
async fn patients_cannot_list_accounts() {
    let w = ward().await;
    let (status, _) = send(&w.app, "GET", "/doctors/", Some(&w.patient), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(&w.app, "GET", "/patients/", Some(&w.patient), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&w.app, "GET", "/patients/", Some(&w.doctor), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn doctor_detail_is_self_only() {
    let w = ward().await;
    let uri = format!("/doctors/{}/", w.doctor_id);
    let (status, body) = send(&w.app, "GET", &uri, Some(&w.doctor), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "id": w.doctor_id, "username": "dr_house" }));

    let (status, _) = send(&w.app, "GET", &uri, Some(&w.outsider), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // A patient id on the doctor endpoint is not a doctor.
    let uri = format!("/doctors/{}/", w.patient_id);
    let (status, body) = send(&w.app, "GET", &uri, Some(&w.doctor), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Doctor not found");
}

#[tokio::test]
async fn doctor_updates_patient_and_patient_updates_self() {
    let w = ward().await;
    let uri = format!("/patients/{}/", w.patient_id);
    let (status, body) = send(
        &w.app,
        "PUT",
        &uri,
        Some(&w.doctor),
        Some(json!({ "username": "johnny" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["detail"], "Patient updated");

    let (status, body) = send(&w.app, "GET", &uri, Some(&w.patient), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "johnny");

    let (status, _) = send(
        &w.app,
        "PUT",
        &uri,
        Some(&w.patient),
        Some(json!({ "username": "dr_house" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn deleting_patient_cascades_records() {
    let w = ward().await;
    let (status, _) = send(
        &w.app,
        "DELETE",
        &format!("/patients/{}/", w.patient_id),
        Some(&w.doctor),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = send(&w.app, "GET", "/patient_records/", Some(&w.doctor), None).await;
    assert!(body.as_array().unwrap().is_empty());

    // Their token died with them.
    let (status, _) = send(&w.app, "GET", "/patient_records/", Some(&w.patient), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn doctor_creates_staff_accounts() {
    let w = ward().await;
    let (status, body) = send(
        &w.app,
        "POST",
        "/patients/",
        Some(&w.doctor),
        Some(json!({ "username": "walk_in", "password": "pw" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["username"], "walk_in");
    assert!(body["id"].is_i64());

    let (status, _) = send(
        &w.app,
        "POST",
        "/doctors/",
        Some(&w.patient),
        Some(json!({ "username": "fake_doc", "password": "pw" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

// ── Departments ────────────────────────────────────────────────

#[tokio::test]
async fn department_list_is_authenticated_by_default() {
    let w = ward().await;
    let (status, _) = send(&w.app, "GET", "/departments/", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&w.app, "GET", "/departments/", Some(&w.patient), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);
    assert_eq!(body[0]["name"], "Diagnostics");
}

#[tokio::test]
async fn department_list_can_be_public() {
    let app = build_app_with(ServiceSettings {
        public_departments: true,
        ..ServiceSettings::default()
    });
    let (status, body) = send(&app, "GET", "/departments/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());

    // Creating still needs a doctor.
    let (status, _) = send(
        &app,
        "POST",
        "/departments/",
        None,
        Some(json!({ "name": "n", "diagnostics": "d", "location": "l", "specialization": "s" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn anonymous_department_create_is_401_whatever_the_body() {
    let app = build_test_app();
    for body in ["{not json", "[]", ""] {
        let req = Request::builder()
            .method("POST")
            .uri("/departments/")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap();
        let resp = app.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "body {body:?}");
    }

    // Without a content type as well.
    let req = Request::builder()
        .method("POST")
        .uri("/departments/")
        .body(Body::from("name=x"))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn overlong_fields_are_400() {
    let app = build_test_app();
    let (status, body) = send(
        &app,
        "POST",
        "/register/",
        None,
        Some(json!({ "username": "u".repeat(151), "password": "pw", "group": "Doctor" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("150"));

    let (token, _) = register(&app, "dr_long", "Doctor").await;
    let (status, _) = send(
        &app,
        "POST",
        "/departments/",
        Some(&token),
        Some(json!({
            "name": "n".repeat(101),
            "diagnostics": "d",
            "location": "l",
            "specialization": "s",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn patients_cannot_create_departments() {
    let w = ward().await;
    let (status, _) = send(
        &w.app,
        "POST",
        "/departments/",
        Some(&w.patient),
        Some(json!({ "name": "n", "diagnostics": "d", "location": "l", "specialization": "s" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn department_membership_endpoints() {
    let w = ward().await;
    let doctors_uri = format!("/department/{}/doctors/", w.department);
    let (status, body) = send(&w.app, "GET", &doctors_uri, Some(&w.doctor), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([{ "id": w.doctor_id, "username": "dr_house" }]));

    let patients_uri = format!("/department/{}/patients/", w.department);
    let (status, body) = send(&w.app, "GET", &patients_uri, Some(&w.doctor), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([{ "id": w.patient_id, "username": "john" }]));

    let (status, body) = send(&w.app, "PUT", &patients_uri, Some(&w.doctor), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["detail"], "Patients updated");

    // Patients may not be made department doctors.
    let (status, _) = send(
        &w.app,
        "PUT",
        &doctors_uri,
        Some(&w.doctor),
        Some(json!({ "doctors": [w.patient_id] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&w.app, "GET", &doctors_uri, Some(&w.patient), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&w.app, "GET", "/department/999/doctors/", Some(&w.doctor), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Department not found");
}

#[tokio::test]
async fn leaving_department_hides_its_records() {
    let w = ward().await;
    join_department(&w.app, &w.doctor, w.department, &[]).await;
    let (_, body) = send(&w.app, "GET", "/patient_records/", Some(&w.doctor), None).await;
    assert!(body.as_array().unwrap().is_empty());

    let uri = format!("/patient_records/{}/", w.record);
    let (status, _) = send(&w.app, "GET", &uri, Some(&w.doctor), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
