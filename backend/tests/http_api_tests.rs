//! HTTP API tests driving the router in-process.
#![cfg(feature = "http-server")]

mod support;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use facility_compare::http::{create_router, AppState};
use facility_compare::models::{FacilityId, FacilityType};

fn app() -> Router {
    create_router(AppState::new(Arc::new(support::seeded_repository())))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn new_session(app: &Router) -> String {
    let (status, body) = send(app, "POST", "/v1/sessions", None).await;
    assert_eq!(status, StatusCode::CREATED);
    body["session_id"].as_str().unwrap().to_string()
}

async fn add(app: &Router, session: &str, id: &str, facility_type: &str) -> Value {
    let (status, body) = send(
        app,
        "POST",
        &format!("/v1/sessions/{}/selection", session),
        Some(json!({"item": {"_id": id, "name": format!("Listing {}", id)}, "type": facility_type})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body
}

#[tokio::test]
async fn test_health_check() {
    let app = app();
    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["repository"], "connected");
}

#[tokio::test]
async fn test_add_and_refusal_notices() {
    let app = app();
    let session = new_session(&app).await;

    let first = add(&app, &session, "h1", "hospital").await;
    assert_eq!(first["added"], true);
    assert_eq!(first["selection"]["type"], "hospital");
    assert_eq!(first["remaining_slots"], 2);
    assert_eq!(first["can_compare"], false);

    let lab = add(&app, &session, "l1", "laboratory").await;
    assert_eq!(lab["added"], false);
    assert_eq!(lab["notice"]["code"], "TYPE_MISMATCH");

    let duplicate = add(&app, &session, "h1", "hospital").await;
    assert_eq!(duplicate["notice"]["code"], "ALREADY_ADDED");
    assert_eq!(
        duplicate["notice"]["message"],
        "Listing h1 is already in comparison list!"
    );

    add(&app, &session, "h2", "hospital").await;
    add(&app, &session, "h3", "hospital").await;
    let full = add(&app, &session, "h4", "hospital").await;
    assert_eq!(full["added"], false);
    assert_eq!(full["notice"]["code"], "CAPACITY_REACHED");
    assert_eq!(full["selection"]["items"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_comparison_needs_two_items() {
    let app = app();
    let session = new_session(&app).await;
    add(&app, &session, "h1", "hospital").await;

    let (status, body) = send(
        &app,
        "GET",
        &format!("/v1/sessions/{}/comparison", session),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "INSUFFICIENT_SELECTION");
    assert_eq!(body["redirect"], "/");
}

#[tokio::test]
async fn test_comparison_table_and_refresh() {
    let app = app();
    let session = new_session(&app).await;
    add(&app, &session, "h1", "hospital").await;
    add(&app, &session, "h2", "hospital").await;

    let (status, table) = send(
        &app,
        "GET",
        &format!("/v1/sessions/{}/comparison?lat=28.6139&lon=77.2090", session),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(table["type"], "hospital");
    assert_eq!(table["header"][0]["name"], "AIIMS");
    assert_eq!(table["header"][1]["detail"]["kind"], "facility_detail");
    assert_eq!(table["sequence"], 1);
    let labels: Vec<&str> = table["rows"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["label"].as_str().unwrap())
        .collect();
    assert_eq!(labels.first(), Some(&"Google Rating"));
    assert!(labels.contains(&"24/7 Emergency"));
    assert_eq!(labels.last(), Some(&"Actions"));

    let (status, refreshed) = send(
        &app,
        "POST",
        &format!("/v1/sessions/{}/comparison/refresh", session),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(refreshed["sequence"], 2);
}

#[tokio::test]
async fn test_refresh_before_load_conflicts() {
    let app = app();
    let session = new_session(&app).await;
    let (status, body) = send(
        &app,
        "POST",
        &format!("/v1/sessions/{}/comparison/refresh", session),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "NOTHING_LOADED");
    assert!(body.get("redirect").is_none());
}

#[tokio::test]
async fn test_invalid_location_is_rejected() {
    let app = app();
    let session = new_session(&app).await;
    let (status, body) = send(
        &app,
        "GET",
        &format!("/v1/sessions/{}/comparison?lat=120&lon=0", session),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_remove_and_clear() {
    let app = app();
    let session = new_session(&app).await;
    add(&app, &session, "h1", "hospital").await;
    add(&app, &session, "h2", "hospital").await;

    let uri = format!("/v1/sessions/{}/selection/h1", session);
    let (status, body) = send(&app, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["selection"]["items"].as_array().unwrap().len(), 1);

    let (status, again) = send(&app, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(again["selection"], body["selection"]);

    let (status, cleared) = send(
        &app,
        "DELETE",
        &format!("/v1/sessions/{}/selection", session),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cleared["remaining_slots"], 3);
    assert!(cleared["selection"]["type"].is_null());
}

#[tokio::test]
async fn test_sessions_are_isolated() {
    let app = app();
    let first = new_session(&app).await;
    let second = new_session(&app).await;
    add(&app, &first, "h1", "hospital").await;

    let (_, body) = send(
        &app,
        "GET",
        &format!("/v1/sessions/{}/selection", second),
        None,
    )
    .await;
    assert!(body["selection"]["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_session_is_not_found() {
    let app = app();
    let (status, body) = send(&app, "GET", "/v1/sessions/nope/selection", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_delete_session() {
    let app = app();
    let session = new_session(&app).await;
    let uri = format!("/v1/sessions/{}", session);

    let (status, _) = send(&app, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_overlapping_first_loads_both_return_a_table() {
    let repo = support::seeded_repository();
    repo.set_latency(
        FacilityType::Hospital,
        &FacilityId::new("h1"),
        Duration::from_millis(150),
    );
    let app = create_router(AppState::new(Arc::new(repo.clone())));
    let session = new_session(&app).await;
    add(&app, &session, "h1", "hospital").await;
    add(&app, &session, "h2", "hospital").await;

    let uri = format!("/v1/sessions/{}/comparison", session);
    let ((first_status, first), (second_status, second)) =
        tokio::join!(send(&app, "GET", &uri, None), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            send(&app, "GET", &uri, None).await
        });

    assert_eq!(first_status, StatusCode::OK);
    assert_eq!(second_status, StatusCode::OK);
    assert_eq!(first["header"][0]["name"], "AIIMS");
    assert_eq!(second["header"][0]["name"], "AIIMS");
    assert_eq!(second["sequence"], 2);
}

#[tokio::test]
async fn test_idle_session_expires() {
    let app = create_router(AppState::with_session_ttl(
        Arc::new(support::seeded_repository()),
        Duration::from_millis(50),
    ));
    let session = new_session(&app).await;
    add(&app, &session, "h1", "hospital").await;

    tokio::time::sleep(Duration::from_millis(100)).await;
    let (status, body) = send(
        &app,
        "GET",
        &format!("/v1/sessions/{}/selection", session),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}
