mod common;

use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use common::test_state_with;
use serde_json::json;
use std::time::Duration;
use tower::ServiceExt; // for .oneshot()

fn login_request(client_ip: &str, password: &str) -> Request<Body> {
    let login_body = json!({"username": "admin", "password": password});
    Request::builder()
        .method("POST")
        .uri("/api/login")
        .header("content-type", "application/json")
        .header("x-forwarded-for", client_ip)
        .body(Body::from(login_body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_login_rate_limit() {
    let app = common::test_router(test_state_with(Duration::from_secs(3600), 5).await);
    // 5 allowed attempts
    for _ in 0..5 {
        let response = app.clone().oneshot(login_request("127.0.0.1", "wrong")).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
    // 6th attempt should be rate limited, even with the right password
    let response = app.clone().oneshot(login_request("127.0.0.1", common::ADMIN_PASSWORD)).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "too many login attempts");
}

#[tokio::test]
async fn test_login_rate_limit_is_per_ip() {
    let app = common::test_router(test_state_with(Duration::from_secs(3600), 2).await);
    for _ in 0..2 {
        let response = app.clone().oneshot(login_request("10.0.0.1", "wrong")).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
    let response = app.clone().oneshot(login_request("10.0.0.1", "wrong")).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    let response = app
        .clone()
        .oneshot(login_request("10.0.0.2, 10.0.0.1", common::ADMIN_PASSWORD))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_rate_limit_only_guards_login() {
    let app = common::test_router(test_state_with(Duration::from_secs(3600), 1).await);
    for i in 0..3 {
        let body = json!({"username": format!("user{i}"), "password": "pw123456"});
        let request = Request::builder()
            .method("POST")
            .uri("/api/register")
            .header("content-type", "application/json")
            .header("x-forwarded-for", "10.0.0.9")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }
}
