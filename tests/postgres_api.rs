//! Runs the API against Postgres. Every test returns early unless
//! `TEST_DATABASE_URL` or `DATABASE_URL` points at a disposable database.

mod common;

use chrono::{Duration, Utc};
use common::*;
use portfolio_api::{
    entities::contact::{ContactForm, ContactNote, RequestMeta, StatusAction},
    repositories::{contact::ContactRepository, sqlx_repo::SqlxContactRepo},
};
use reqwest::StatusCode;
use serde_json::{json, Value};
use sqlx::PgPool;

macro_rules! postgres_app {
    () => {
        match TestApp::spawn_postgres().await {
            Some(app) => app,
            None => {
                eprintln!("skipping: TEST_DATABASE_URL / DATABASE_URL not set");
                return;
            }
        }
    };
}

fn pool(app: &TestApp) -> PgPool {
    app.pool.clone().expect("postgres app without a pool")
}

async fn stored_message(pool: &PgPool) -> portfolio_api::entities::contact::ContactMessage {
    let form: ContactForm = serde_json::from_value(contact_body()).unwrap();
    let new = form.into_new_message(RequestMeta::default(), Utc::now()).unwrap();
    SqlxContactRepo::new(pool.clone()).create(&new).await.unwrap()
}

#[actix_rt::test]
async fn view_counters_increment_in_the_database() {
    let app = postgres_app!();
    let token = app.admin_token().await;
    let project = app.create_project(&token, &project_body("Trail Log")).await;
    let id = project["id"].as_str().unwrap();

    app.get(&format!("/api/projects/{}", id)).await;
    let body: Value = app.get(&format!("/api/projects/{}", id)).await.json().await.unwrap();
    assert_eq!(body["data"]["metrics"]["views"], 2);

    let body: Value = app.get("/api/projects/slug/trail-log").await.json().await.unwrap();
    assert_eq!(body["data"]["metrics"]["views"], 3);

    let response = app.post_json(&format!("/api/projects/{}/like", id), &json!({})).await;
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["likes"], 1);
    let response = app.post_json(&format!("/api/projects/{}/like", id), &json!({})).await;
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["likes"], 2);
}

#[actix_rt::test]
async fn duplicate_slug_maps_to_conflict() {
    let app = postgres_app!();
    let token = app.admin_token().await;
    app.create_project(&token, &project_body("Same Name")).await;

    let response = app.admin_post(&token, "/api/admin/projects", &project_body("same  name!")).await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
}

#[actix_rt::test]
async fn listing_filters_search_and_pages() {
    let app = postgres_app!();
    let token = app.admin_token().await;
    for (title, priority) in [("Weather Dashboard", 3), ("Rust Search Engine", 7), ("Habit Tracker", 5)] {
        let mut body = project_body(title);
        body["priority"] = json!(priority);
        app.create_project(&token, &body).await;
    }

    let body: Value = app.get("/api/projects?search=dashboards").await.json().await.unwrap();
    assert_eq!(body["pagination"]["totalItems"], 1);
    assert_eq!(body["data"][0]["title"], "Weather Dashboard");

    let response = app.get("/api/projects?search=%21%21%21").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: Value = app.get("/api/projects?sort=-priority&page=2&limit=2").await.json().await.unwrap();
    assert_eq!(body["pagination"]["totalItems"], 3);
    assert_eq!(body["data"][0]["title"], "Weather Dashboard");

    let body: Value = app.get("/api/projects/stats").await.json().await.unwrap();
    assert_eq!(body["data"]["overview"]["totalProjects"], 3);
}

#[actix_rt::test]
async fn update_toggle_and_soft_delete() {
    let app = postgres_app!();
    let token = app.admin_token().await;
    let project = app.create_project(&token, &project_body("Old Title")).await;
    let id = project["id"].as_str().unwrap().to_string();

    let response = app
        .admin_patch(&token, &format!("/api/admin/projects/{}", id), &json!({ "title": "New Title" }))
        .await;
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["slug"], "new-title");

    let response = app
        .admin_post(&token, &format!("/api/admin/projects/{}/toggle-featured", id), &json!({}))
        .await;
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["featured"], true);

    let response = app.admin_delete(&token, &format!("/api/admin/projects/{}", id)).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let response = app.get(&format!("/api/projects/{}", id)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn stale_status_change_matches_no_row() {
    let app = postgres_app!();
    let pool = pool(&app);
    let repo = SqlxContactRepo::new(pool.clone());
    let contact = stored_message(&pool).await;

    let read = contact.plan(StatusAction::MarkRead, Utc::now()).unwrap().unwrap();
    let close = contact.plan(StatusAction::Close, Utc::now()).unwrap().unwrap();

    let updated = repo.apply_status_change(&contact.id, &read).await.unwrap().unwrap();
    assert_eq!(updated.status.as_str(), "Read");
    // Planned against `New`, but the row is now `Read`.
    assert!(repo.apply_status_change(&contact.id, &close).await.unwrap().is_none());
}

#[actix_rt::test]
async fn notes_append_in_order() {
    let app = postgres_app!();
    let pool = pool(&app);
    let repo = SqlxContactRepo::new(pool.clone());
    let contact = stored_message(&pool).await;

    for content in ["Called back", "Sent a calendar invite"] {
        let note = ContactNote { content: content.into(), added_by: "Owner".into(), added_at: Utc::now() };
        repo.add_note(&contact.id, &note).await.unwrap().unwrap();
    }

    let stored = repo.get(&contact.id).await.unwrap().unwrap();
    let contents: Vec<&str> = stored.notes.iter().map(|n| n.content.as_str()).collect();
    assert_eq!(contents, vec!["Called back", "Sent a calendar invite"]);
}

#[actix_rt::test]
async fn inbox_workflow_over_http() {
    let app = postgres_app!();
    let token = app.admin_token().await;
    let response = app.post_json("/api/contact", &contact_body()).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.unwrap();
    let id = body["data"]["id"].as_str().unwrap().to_string();

    for (action, expected) in [("read", "Read"), ("in-progress", "In Progress"), ("replied", "Replied")] {
        let response = app
            .admin_post(&token, &format!("/api/admin/contacts/{}/{}", id, action), &json!({}))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["data"]["status"], expected);
    }

    let response = app
        .admin_post(&token, &format!("/api/admin/contacts/{}/notes", id), &json!({ "content": "Offer sent" }))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["notes"].as_array().unwrap().last().unwrap()["content"], "Offer sent");

    let body: Value = app.get("/api/contact/stats").await.json().await.unwrap();
    assert_eq!(body["data"]["overview"]["totalMessages"], 1);
    assert_eq!(body["data"]["overview"]["unreadMessages"], 0);
}

#[actix_rt::test]
async fn stale_closed_messages_are_archived() {
    let app = postgres_app!();
    let pool = pool(&app);
    let repo = SqlxContactRepo::new(pool.clone());
    let old = stored_message(&pool).await;
    let fresh = stored_message(&pool).await;

    sqlx::query("UPDATE contact_messages SET status = 'Closed', updated_at = NOW() - INTERVAL '40 days' WHERE id = $1")
        .bind(old.id)
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("UPDATE contact_messages SET status = 'Closed' WHERE id = $1")
        .bind(fresh.id)
        .execute(&pool)
        .await
        .unwrap();

    let cutoff = Utc::now() - Duration::days(30);
    assert_eq!(repo.archive_stale(cutoff).await.unwrap(), 1);
    assert_eq!(repo.archive_stale(cutoff).await.unwrap(), 0);
    assert!(repo.get(&old.id).await.unwrap().unwrap().is_archived);
    assert!(!repo.get(&fresh.id).await.unwrap().unwrap().is_archived);
}

#[actix_rt::test]
async fn experiences_and_achievements_round_trip() {
    let app = postgres_app!();
    let token = app.admin_token().await;

    let response = app
        .admin_post(
            &token,
            "/api/admin/experiences",
            &json!({ "organization": "Northwind Labs", "role": "Backend Engineer", "type": "work", "start": "2022-09-01" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = app.get("/api/experiences/current").await.json().await.unwrap();
    assert_eq!(body["data"][0]["organization"], "Northwind Labs");

    let response = app
        .admin_post(
            &token,
            "/api/admin/achievements",
            &json!({ "title": "Hackathon Winner", "organization": "OpenData", "type": "hackathon", "date": "2022-04-10", "rank": 1, "totalParticipants": 40 }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = app.get("/api/achievements").await.json().await.unwrap();
    assert_eq!(body["data"][0]["performancePercentage"], 100);
}

#[actix_rt::test]
async fn schema_rejects_out_of_range_rows() {
    let app = postgres_app!();
    let pool = pool(&app);

    let result = sqlx::query(
        "INSERT INTO projects (title, slug, description, category, priority, icon, created_by) \
         VALUES ('Bad', 'bad', 'Out of range priority', 'Web Development', 0, 'code', 'Owner')",
    )
    .execute(&pool)
    .await;
    assert!(result.is_err());

    let result = sqlx::query(
        "INSERT INTO projects (title, slug, description, category, icon, created_by) \
         VALUES ('Bad', 'bad', 'Unknown category', 'Gardening', 'code', 'Owner')",
    )
    .execute(&pool)
    .await;
    assert!(result.is_err());

    let priority: i32 = sqlx::query_scalar(
        "INSERT INTO projects (title, slug, description, category, icon, created_by) \
         VALUES ('Fine', 'fine', 'Default priority', 'Web Development', 'code', 'Owner') \
         RETURNING priority",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(priority, 5);
}
