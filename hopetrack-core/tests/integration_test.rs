//! Integration tests for HOPETRACK
//!
//! These tests verify end-to-end functionality including:
//! - Notification derivation persisted across restarts
//! - Case API calls against a local stub server
//! - Exports written to disk, including the bulk PDF fallback

use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::{Duration, TimeZone, Utc};
use hopetrack::error::AppError;
use hopetrack::export::pdf::PdfOptions;
use hopetrack::models::{CaseRecord, NotificationType};
use hopetrack::services::{ApiSettings, CaseApi, CaseService, ExportService, NotificationCenter};
use hopetrack::status::StatusBucket;
use hopetrack::storage::JsonFileStore;
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Requests seen by a stub route: "METHOD path" and the request body.
type Seen = Arc<Mutex<Vec<(String, String)>>>;

/// Serve `app` on an ephemeral port and return the API base URL.
async fn serve_stub(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    format!("http://{}/api", addr)
}

fn record(seen: &Seen, request: &str, body: String) {
    seen.lock().unwrap().push((request.to_string(), body));
}

fn error_reply(status: StatusCode, body: Value) -> (StatusCode, Json<Value>) {
    (status, Json(body))
}

fn api_for(base_url: &str) -> CaseApi {
    CaseApi::new(&ApiSettings {
        base_url: base_url.to_string(),
        token: Some("test-token".to_string()),
        timeout_secs: 5,
    })
    .unwrap()
}

fn sample_cases() -> Value {
    json!([
        {"id": 1, "firstName": "Ana", "lastName": "Reyes", "status": "active", "caseType": "Youth"},
        {"id": 2, "first_name": "Ben", "last_name": "Cruz", "status": "Archived"},
        {"id": 3, "firstName": "Cara", "status": "aftercare"}
    ])
}

#[tokio::test]
async fn test_notifications_survive_restart() {
    let temp_dir = TempDir::new().unwrap();
    let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    let cases: Vec<CaseRecord> = vec![
        json!({"id": 1, "firstName": "Ana", "status": "active", "caseType": "Youth"}).into(),
        json!({
            "id": 2,
            "firstName": "Ben",
            "status": "closed",
            "lastUpdated": (now - Duration::days(45)).to_rfc3339()
        })
        .into(),
    ];

    {
        let store = Arc::new(JsonFileStore::in_dir(temp_dir.path()));
        let mut center = NotificationCenter::open(store).unwrap();
        let added = center.derive(&cases, now).unwrap();

        let ids: Vec<&str> = added.iter().map(|n| n.id.as_str()).collect();
        assert!(ids.contains(&"new-case-1"));
        assert!(ids.contains(&"admission-1"));
        assert!(ids.contains(&"archived-2"));
        assert!(ids.contains(&"followup-2"));

        let followup = added.iter().find(|n| n.id == "followup-2").unwrap();
        assert_eq!(followup.kind, NotificationType::Reminder);
        assert!(followup.message.contains("45 days"));

        assert!(center.dismiss("admission-1").unwrap());
        assert!(center.mark_read("new-case-1").unwrap());
    }

    // Reopen from disk
    let store = Arc::new(JsonFileStore::in_dir(temp_dir.path()));
    let mut center = NotificationCenter::open(store).unwrap();
    assert!(center.is_dismissed("admission-1"));
    assert!(center.notifications().iter().all(|n| n.id != "admission-1"));
    assert!(center
        .notifications()
        .iter()
        .any(|n| n.id == "new-case-1" && n.read));

    // Nothing new on a second pass; dismissed items stay gone
    let again = center.derive(&cases, now).unwrap();
    assert!(again.is_empty());
    assert!(center.notifications().iter().all(|n| n.id != "admission-1"));
}

#[tokio::test]
async fn test_case_service_lists_and_moves_to_after_care() {
    let seen = Seen::default();
    let app = Router::new()
        .route(
            "/api/cases/all",
            get(|| async { Json(json!({ "cases": sample_cases() })) }),
        )
        .route(
            "/api/cases/1",
            put(|State(seen): State<Seen>, body: String| async move {
                let sent: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
                record(&seen, "PUT /api/cases/1", body);
                Json(json!({ "data": sent }))
            }),
        )
        .fallback(|| async { error_reply(StatusCode::NOT_FOUND, json!({"message": "no route"})) })
        .with_state(seen.clone());
    let base_url = serve_stub(app).await;

    let mut service = CaseService::new(api_for(&base_url));
    assert_eq!(service.refresh().await.unwrap(), 3);
    assert_eq!(service.by_bucket(StatusBucket::Active).len(), 1);
    assert_eq!(service.by_bucket(StatusBucket::Archived).len(), 1);
    assert_eq!(service.by_bucket(StatusBucket::AfterCare).len(), 1);

    let moved = service.move_to_after_care(1).await.unwrap();
    assert_eq!(moved.status(), Some(&json!("After Care")));
    assert!(moved.last_updated().is_some());
    assert_eq!(service.by_bucket(StatusBucket::AfterCare).len(), 2);

    // The full record was sent in one PUT
    let requests = seen.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let sent: Value = serde_json::from_str(&requests[0].1).unwrap();
    assert_eq!(sent["firstName"], "Ana");
    assert_eq!(sent["status"], "After Care");
}

#[tokio::test]
async fn test_rejected_transition_keeps_local_status() {
    let app = Router::new()
        .route("/api/cases/all", get(|| async { Json(sample_cases()) }))
        .fallback(|| async { error_reply(StatusCode::FORBIDDEN, json!({"error": "forbidden"})) });
    let base_url = serve_stub(app).await;

    let mut service = CaseService::new(api_for(&base_url));
    service.refresh().await.unwrap();

    match service.move_to_after_care(1).await {
        Err(AppError::Api { status, message }) => {
            assert_eq!(status, 403);
            assert_eq!(message, "forbidden");
        }
        other => panic!("expected API error, got {:?}", other.map(|_| ())),
    }
    assert_eq!(service.find(1).unwrap().status(), Some(&json!("active")));
}

#[tokio::test]
async fn test_case_export_uses_full_details() {
    let seen = Seen::default();
    let app = Router::new()
        .route(
            "/api/cases/1",
            get(|State(seen): State<Seen>| async move {
                record(&seen, "GET /api/cases/1", String::new());
                Json(json!({
                    "id": 1,
                    "firstName": "Ana",
                    "lastName": "Reyes",
                    "problemPresented": "Needs shelter",
                    "familyMembers": [{"name": "Rosa Reyes", "relation": "Mother"}]
                }))
            }),
        )
        .fallback(|| async { error_reply(StatusCode::NOT_FOUND, json!({})) })
        .with_state(seen.clone());
    let base_url = serve_stub(app).await;

    let temp_dir = TempDir::new().unwrap();
    let service = ExportService::new(
        api_for(&base_url),
        temp_dir.path().join("exports"),
        PdfOptions::default(),
    );
    let summary = CaseRecord::from(json!({"id": 1, "firstName": "Ana"}));

    let path = service.export_case_spreadsheet(&summary).await.unwrap();
    let html = std::fs::read_to_string(&path).unwrap();
    assert!(html.contains("Needs shelter"));
    assert!(html.contains("Rosa Reyes"));
    assert!(path
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with("HOPETRACK_CaseSpreadsheet_Ana_Reyes_"));

    // Details came from the case endpoint
    assert!(seen
        .lock()
        .unwrap()
        .iter()
        .any(|(request, _)| request == "GET /api/cases/1"));
}

#[tokio::test]
async fn test_bulk_pdf_prefers_server_render() {
    let seen = Seen::default();
    let app = Router::new()
        .route(
            "/api/export/cases/pdf-html",
            post(|State(seen): State<Seen>, body: String| async move {
                record(&seen, "POST /api/export/cases/pdf-html", body);
                (
                    [(header::CONTENT_TYPE, "application/pdf")],
                    b"%PDF-1.4 server".to_vec(),
                )
            }),
        )
        .fallback(|| async {
            error_reply(StatusCode::INTERNAL_SERVER_ERROR, json!({"message": "down"}))
        })
        .with_state(seen.clone());
    let base_url = serve_stub(app).await;

    let temp_dir = TempDir::new().unwrap();
    let service = ExportService::new(
        api_for(&base_url),
        temp_dir.path().to_path_buf(),
        PdfOptions::default(),
    );
    let cases: Vec<CaseRecord> = vec![
        json!({"id": 1, "firstName": "Ana"}).into(),
        json!({"id": 2, "firstName": "Ben"}).into(),
    ];

    let path = service.export_all_pdf(&cases).await.unwrap().unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.4 server");

    // Failed detail fetches fell back to the summaries that were posted
    let requests = seen.lock().unwrap();
    let (_, body) = requests
        .iter()
        .find(|(request, _)| request.starts_with("POST"))
        .unwrap();
    let posted: Value = serde_json::from_str(body).unwrap();
    assert_eq!(posted["cases"].as_array().unwrap().len(), 2);
    assert_eq!(posted["cases"][1]["firstName"], "Ben");
}

#[tokio::test]
async fn test_bulk_pdf_falls_back_when_server_fails() {
    let app = Router::new().fallback(|| async {
        error_reply(StatusCode::BAD_GATEWAY, json!({"message": "bad gateway"}))
    });
    let base_url = serve_stub(app).await;

    let temp_dir = TempDir::new().unwrap();
    let service = ExportService::new(
        api_for(&base_url),
        temp_dir.path().to_path_buf(),
        PdfOptions::default(),
    );
    let cases: Vec<CaseRecord> = vec![json!({"id": 1, "firstName": "Ana"}).into()];

    let path = service.export_all_pdf(&cases).await.unwrap().unwrap();
    let bytes = std::fs::read(&path).unwrap();
    assert!(bytes.starts_with(b"%PDF"));
    assert!(lopdf::Document::load_mem(&bytes).is_ok());
}
