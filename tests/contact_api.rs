mod common;

use common::*;
use reqwest::StatusCode;
use serde_json::{json, Value};

async fn submit(app: &TestApp, body: &Value) -> (StatusCode, Value) {
    let response = app.post_json("/api/contact", body).await;
    let status = response.status();
    (status, response.json().await.unwrap())
}

#[actix_rt::test]
async fn submission_is_stored_and_mailed() {
    let app = TestApp::spawn().await;

    let (status, body) = submit(&app, &contact_body()).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "received");
    assert_eq!(body["data"]["emailSent"], true);

    let sent = app.mailer.sent.lock();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].to, OWNER_ADDRESS);
    assert_eq!(sent[0].reply_to.as_deref(), Some("ada@example.com"));
    assert_eq!(sent[1].to, "ada@example.com");
}

#[actix_rt::test]
async fn spam_is_accepted_quietly_without_mail() {
    let app = TestApp::spawn().await;
    let mut body = contact_body();
    body["message"] = json!("Congratulations winner, claim your casino lottery prize today.");

    let (status, body) = submit(&app, &body).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(app.mailer.sent.lock().is_empty());
}

#[actix_rt::test]
async fn honeypot_and_invalid_fields_are_rejected() {
    let app = TestApp::spawn().await;

    let mut trap = contact_body();
    trap["honeypot"] = json!("http://bot.example");
    let (status, _) = submit(&app, &trap).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut invalid = contact_body();
    invalid["email"] = json!("not-an-email");
    invalid["subject"] = json!("Hi");
    let (status, body) = submit(&app, &invalid).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let fields: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|d| d["field"].as_str())
        .collect();
    assert!(fields.contains(&"email"));
    assert!(fields.contains(&"subject"));
}

#[actix_rt::test]
async fn malformed_json_is_a_bad_request() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .post(app.url("/api/contact"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
}

#[actix_rt::test]
async fn submissions_are_rate_limited_per_client() {
    let app = TestApp::spawn_with(|config| config.contact_rate_limit = 2).await;

    for _ in 0..2 {
        let (status, _) = submit(&app, &contact_body()).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let response = app.post_json("/api/contact", &contact_body()).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key("retry-after"));

    // Other routes draw from the general bucket.
    let response = app.get("/api/contact/stats").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[actix_rt::test]
async fn inbox_workflow() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    let (_, body) = submit(&app, &contact_body()).await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let body: Value = app.admin_get(&token, "/api/admin/contacts/unread").await.json().await.unwrap();
    assert_eq!(body["meta"]["count"], 1);

    let response = app
        .admin_post(&token, &format!("/api/admin/contacts/{}/resolve", id), &json!({}))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    for (action, expected) in [("read", "Read"), ("read", "Read"), ("replied", "Replied"), ("resolve", "Resolved")] {
        let response = app
            .admin_post(&token, &format!("/api/admin/contacts/{}/{}", id, action), &json!({}))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["data"]["status"], expected);
    }

    let response = app
        .admin_post(&token, &format!("/api/admin/contacts/{}/teleport", id), &json!({}))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .admin_post(&token, &format!("/api/admin/contacts/{}/notes", id), &json!({ "content": "Sent a calendar invite" }))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.unwrap();
    let notes = body["data"]["notes"].as_array().unwrap();
    assert_eq!(notes.last().unwrap()["content"], "Sent a calendar invite");

    let body: Value = app.admin_get(&token, &format!("/api/admin/contacts/{}", id)).await.json().await.unwrap();
    assert!(body["data"]["responseTimeHours"].is_number());
    assert_eq!(body["data"]["emailSent"], true);
}

#[actix_rt::test]
async fn archived_messages_leave_the_listing() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    let (_, body) = submit(&app, &contact_body()).await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let body: Value = app.admin_get(&token, "/api/admin/contacts").await.json().await.unwrap();
    assert_eq!(body["pagination"]["totalItems"], 1);

    let response = app
        .admin_post(&token, &format!("/api/admin/contacts/{}/archive", id), &json!({}))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = app.admin_get(&token, "/api/admin/contacts").await.json().await.unwrap();
    assert_eq!(body["pagination"]["totalItems"], 0);
}

#[actix_rt::test]
async fn listing_rejects_unknown_status() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;

    let response = app.admin_get(&token, "/api/admin/contacts?status=Lost").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[actix_rt::test]
async fn public_stats_count_messages() {
    let app = TestApp::spawn().await;
    submit(&app, &contact_body()).await;

    let body: Value = app.get("/api/contact/stats").await.json().await.unwrap();

    assert_eq!(body["data"]["overview"]["totalMessages"], 1);
    assert_eq!(body["data"]["overview"]["unreadMessages"], 1);
}

#[actix_rt::test]
async fn urgent_keywords_win_over_high_ones() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    let body = json!({
        "name": "Jo Lee",
        "email": "jo@x.com",
        "subject": "Hello there",
        "message": "This is urgent, please reply ASAP regarding a job opportunity."
    });

    let (status, body) = submit(&app, &body).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["status"], "received");
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let body: Value = app.admin_get(&token, &format!("/api/admin/contacts/{}", id)).await.json().await.unwrap();
    assert_eq!(body["data"]["priority"], "urgent");
    assert_eq!(body["data"]["isSpam"], false);
    assert_eq!(body["data"]["followUpRequired"], true);

    let body: Value = app.admin_get(&token, "/api/admin/contacts/urgent").await.json().await.unwrap();
    assert_eq!(body["meta"]["count"], 1);
}
