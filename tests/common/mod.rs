//! Shared helpers for driving the router in integration tests.

#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt; // for .collect().await
use itemvault::auth::TokenService;
use itemvault::store::RecordStore;
use itemvault::web::api::{AppState, AppStateInner, create_router_with_state};
use itemvault::web::cors::AllowedOrigins;
use itemvault::web::rate_limiter::RateLimiter;
use itemvault::BcryptHasher;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt; // for `oneshot`

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "adminpass";

pub async fn test_state_with(expiry: Duration, max_attempts: u32) -> AppState {
    let store = Arc::new(RecordStore::new(Arc::new(BcryptHasher::fast())));
    store.ensure_admin_user(ADMIN_USERNAME, ADMIN_PASSWORD).await.unwrap();
    let tokens = Arc::new(TokenService::new("test-secret", "itemvault-test", expiry));
    let rate_limiter = RateLimiter::new(max_attempts, Duration::from_secs(60));
    AppStateInner::new(store, tokens, rate_limiter)
}

pub async fn test_state() -> AppState {
    test_state_with(Duration::from_secs(3600), 100).await
}

/// Router with only the local frontend origins allowed.
pub fn test_router(state: AppState) -> Router {
    create_router_with_state(state, &AllowedOrigins::from_config(&[], Some(8080)))
}

pub async fn test_app() -> Router {
    test_router(test_state().await)
}

pub async fn send(app: &Router, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

pub async fn register(app: &Router, username: &str, password: &str) -> (StatusCode, Value) {
    send(app, "POST", "/api/register", None, Some(json!({ "username": username, "password": password }))).await
}

pub async fn login(app: &Router, username: &str, password: &str) -> String {
    let (status, body) = send(app, "POST", "/api/login", None, Some(json!({ "username": username, "password": password }))).await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    body["token"].as_str().unwrap().to_string()
}

pub async fn admin_token(app: &Router) -> String {
    login(app, ADMIN_USERNAME, ADMIN_PASSWORD).await
}
