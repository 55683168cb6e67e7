mod common;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use common::{app, app_with, send, test_config};
use serde_json::{json, Value as JsonValue};
use tower::ServiceExt;
use uuid::Uuid;

async fn with_header(uri: &str, authorization: &str) -> (StatusCode, JsonValue) {
    let req = Request::builder()
        .uri(uri)
        .header("authorization", authorization)
        .body(Body::empty())
        .unwrap();
    let resp = app().oneshot(req).await.unwrap();
    let status = resp.status();
    let body = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn health_is_public() {
    let (status, body) = send(&app(), "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "atelier-backend");
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    let app = app();
    for (method, uri) in [
        ("POST", "/jobs/create"),
        ("GET", "/jobs/user/applications"),
        ("GET", "/jobs/user/recommendations"),
        ("GET", "/contracts"),
        ("GET", "/profiles/me"),
    ] {
        let body = (method == "POST").then(|| json!({}));
        let (status, _) = send(&app, method, uri, None, body).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{} {}", method, uri);
    }
}

#[tokio::test]
async fn malformed_credentials_are_rejected() {
    let (status, body) = with_header("/jobs/browse", "Bearer not-a-jwt").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid_token");

    let (status, body) = with_header("/jobs/browse", "Basic dXNlcjpwYXNz").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unsupported_scheme");
}

#[tokio::test]
async fn anonymous_browsing_is_allowed() {
    let (status, body) = send(&app(), "GET", "/jobs/browse", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 0);
    assert_eq!(body["page"], 1);
}

#[tokio::test]
async fn unknown_resources_are_not_found() {
    let app = app();
    let user = Uuid::new_v4();
    let (status, _) = send(&app, "GET", &format!("/jobs/{}", Uuid::new_v4()), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, "GET", &format!("/contracts/{}", Uuid::new_v4()), Some(user), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, "GET", "/profiles/me", Some(user), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn anonymous_traffic_shares_the_public_budget() {
    let app = app_with(test_config(2, 1000));
    let mut statuses = Vec::new();
    for _ in 0..3 {
        let (status, _) = send(&app, "GET", "/jobs/browse", None, None).await;
        statuses.push(status);
    }
    assert_eq!(statuses.iter().filter(|s| **s == StatusCode::TOO_MANY_REQUESTS).count(), 1);

    let (status, _) = send(&app, "GET", "/jobs/browse", Some(Uuid::new_v4()), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
}
