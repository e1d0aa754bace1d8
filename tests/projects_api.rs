mod common;

use common::*;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[actix_rt::test]
async fn empty_listing_has_pagination_envelope() {
    let app = TestApp::spawn().await;

    let response = app.get("/api/projects").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"], json!([]));
    assert_eq!(body["pagination"]["totalItems"], 0);
    assert_eq!(body["pagination"]["currentPage"], 1);
    assert_eq!(body["meta"]["count"], 0);
}

#[actix_rt::test]
async fn created_project_gets_slug_and_defaults() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;

    let project = app.create_project(&token, &project_body("Rust Portfolio API")).await;

    assert_eq!(project["slug"], "rust-portfolio-api");
    assert_eq!(project["isActive"], true);
    assert_eq!(project["metrics"]["views"], 0);
    assert_eq!(project["seo"]["metaTitle"], "Rust Portfolio API");
}

#[actix_rt::test]
async fn viewing_by_slug_counts_views() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    app.create_project(&token, &project_body("Trail Log")).await;

    app.get("/api/projects/slug/trail-log").await;
    let response = app.get("/api/projects/slug/trail-log").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["metrics"]["views"], 2);
}

#[actix_rt::test]
async fn like_returns_new_count() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    let project = app.create_project(&token, &project_body("Churn Predictor")).await;
    let id = project["id"].as_str().unwrap();

    let response = app.post_json(&format!("/api/projects/{}/like", id), &json!({})).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["likes"], 1);
}

#[actix_rt::test]
async fn listing_filters_by_search_and_featured() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    let mut featured = project_body("Compiler Playground");
    featured["featured"] = json!(true);
    app.create_project(&token, &featured).await;
    app.create_project(&token, &project_body("Weather Dashboard")).await;

    let body: Value = app.get("/api/projects?search=compiler").await.json().await.unwrap();
    assert_eq!(body["pagination"]["totalItems"], 1);
    assert_eq!(body["data"][0]["title"], "Compiler Playground");
    assert_eq!(body["meta"]["query"]["search"], "compiler");

    let body: Value = app.get("/api/projects/featured").await.json().await.unwrap();
    assert_eq!(body["meta"]["count"], 1);
}

#[actix_rt::test]
async fn invalid_list_parameters_are_rejected() {
    let app = TestApp::spawn().await;

    let response = app.get("/api/projects?limit=500&sort=-banana").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Validation Error");
}

#[actix_rt::test]
async fn malformed_and_unknown_ids() {
    let app = TestApp::spawn().await;

    let response = app.get("/api/projects/not-a-uuid").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.get(&format!("/api/projects/{}", uuid::Uuid::new_v4())).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn search_needs_a_word() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    app.create_project(&token, &project_body("Weather Dashboard")).await;

    let response = app.get("/api/projects?search=%21%21%21").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: Value = app.get("/api/projects?search=dashboards").await.json().await.unwrap();
    assert_eq!(body["pagination"]["totalItems"], 1);
}

#[actix_rt::test]
async fn duplicate_title_is_a_conflict() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    app.create_project(&token, &project_body("Same Name")).await;

    let response = app.admin_post(&token, "/api/admin/projects", &project_body("Same Name")).await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[actix_rt::test]
async fn update_toggle_and_delete_lifecycle() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    let project = app.create_project(&token, &project_body("Old Title")).await;
    let id = project["id"].as_str().unwrap().to_string();

    let response = app
        .admin_patch(&token, &format!("/api/admin/projects/{}", id), &json!({ "title": "New Title" }))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
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
async fn stats_and_categories_reflect_active_projects() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    app.create_project(&token, &project_body("First Project")).await;
    let mut data = project_body("Second Project");
    data["category"] = json!("Data Science");
    app.create_project(&token, &data).await;

    let body: Value = app.get("/api/projects/stats").await.json().await.unwrap();
    assert_eq!(body["data"]["overview"]["totalProjects"], 2);

    let body: Value = app.get("/api/projects/categories").await.json().await.unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[actix_rt::test]
async fn filters_combine_as_a_conjunction() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    for (title, category, featured) in [
        ("Vision Classifier", "AI/ML", true),
        ("Speech Tagger", "AI/ML", true),
        ("Prompt Router", "AI/ML", false),
        ("Shop Frontend", "Web Development", true),
        ("Ledger Explorer", "Blockchain", false),
        ("Habit Tracker", "Mobile App", false),
    ] {
        let mut body = project_body(title);
        body["category"] = json!(category);
        body["featured"] = json!(featured);
        app.create_project(&token, &body).await;
    }

    let body: Value = app
        .get("/api/projects?category=AI%2FML&featured=true&page=1&limit=2")
        .await
        .json()
        .await
        .unwrap();

    let titles: Vec<&str> = body["data"].as_array().unwrap().iter().map(|p| p["title"].as_str().unwrap()).collect();
    assert_eq!(titles.len(), 2);
    assert!(titles.contains(&"Vision Classifier"));
    assert!(titles.contains(&"Speech Tagger"));
    assert_eq!(body["pagination"]["totalItems"], 2);
    assert_eq!(body["pagination"]["totalPages"], 1);
    assert_eq!(body["pagination"]["hasNextPage"], false);
}

#[actix_rt::test]
async fn pages_skip_earlier_rows() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    for priority in 1..=5 {
        let mut body = project_body(&format!("Project Number {}", priority));
        body["priority"] = json!(priority);
        app.create_project(&token, &body).await;
    }

    let body: Value = app.get("/api/projects?sort=-priority&page=2&limit=2").await.json().await.unwrap();

    let priorities: Vec<i64> = body["data"].as_array().unwrap().iter().map(|p| p["priority"].as_i64().unwrap()).collect();
    assert_eq!(priorities, vec![3, 2]);
    assert_eq!(body["pagination"]["totalPages"], 3);
    assert_eq!(body["pagination"]["hasPrevPage"], true);
}

#[actix_rt::test]
async fn slug_strips_symbols_and_collapses_separators() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;

    let project = app.create_project(&token, &project_body("AI Resume Analyzer! (v2)")).await;

    assert_eq!(project["slug"], "ai-resume-analyzer-v2");
}

#[actix_rt::test]
async fn viewing_by_id_twice_adds_two_views() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    let project = app.create_project(&token, &project_body("Counter Demo")).await;
    let path = format!("/api/projects/{}", project["id"].as_str().unwrap());

    app.get(&path).await;
    let body: Value = app.get(&path).await.json().await.unwrap();

    assert_eq!(body["data"]["metrics"]["views"], 2);
}
