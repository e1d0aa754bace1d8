mod common;

use common::*;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[actix_rt::test]
async fn login_issues_bearer_token() {
    let app = TestApp::spawn().await;

    let response = app.post_json("/api/admin/login", &json!({ "password": ADMIN_PASSWORD })).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert!(!body["access_token"].as_str().unwrap().is_empty());
    assert_eq!(body["token_type"], "Bearer");
    assert!(body["expires_in"].as_i64().unwrap() > 0);
}

#[actix_rt::test]
async fn wrong_password_is_unauthorized() {
    let app = TestApp::spawn().await;

    let response = app.post_json("/api/admin/login", &json!({ "password": "guess" })).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
}

#[actix_rt::test]
async fn login_is_refused_without_configured_hash() {
    let app = TestApp::spawn_with(|config| config.admin_password_hash = None).await;

    let response = app.post_json("/api/admin/login", &json!({ "password": ADMIN_PASSWORD })).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[actix_rt::test]
async fn admin_routes_require_a_valid_token() {
    let app = TestApp::spawn().await;

    let response = app.get("/api/admin/contacts").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app.admin_get("not.a.jwt", "/api/admin/contacts").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app.post_json("/api/admin/projects", &project_body("Sneaky")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let token = app.admin_token().await;
    let response = app.admin_get(&token, "/api/admin/contacts").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[actix_rt::test]
async fn health_reports_storage() {
    let app = TestApp::spawn().await;

    let response = app.get("/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "OK");
    assert_eq!(body["storage"], "memory");
    assert!(body["uptimeSeconds"].is_number());
}

#[actix_rt::test]
async fn unknown_routes_get_json_404() {
    let app = TestApp::spawn().await;

    let response = app.get("/api/nowhere").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert!(body["availableEndpoints"].is_array());
}

#[actix_rt::test]
async fn trailing_slashes_are_normalized() {
    let app = TestApp::spawn().await;

    let response = app.get("/api/projects/").await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[actix_rt::test]
async fn home_lists_endpoints() {
    let app = TestApp::spawn().await;

    let body: Value = app.get("/").await.json().await.unwrap();

    assert_eq!(body["success"], true);
    assert!(body["endpoints"].is_array());
}
