#![allow(dead_code)]

use std::{env, net::TcpListener, sync::Arc, time::Duration};

use actix_web::{middleware::NormalizePath, web, App, HttpServer};
use async_trait::async_trait;
use parking_lot::Mutex;
use portfolio_api::{
    auth::password::hash_password,
    configure_app,
    db::postgres::{create_pool, run_migrations},
    mail::{MailError, Mailer, OutgoingEmail},
    memory::MemoryStore,
    settings::AppConfig,
    AppState, Repositories,
};
use once_cell::sync::Lazy;
use reqwest::Client;
use serde_json::{json, Value};
use sqlx::PgPool;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

pub const ADMIN_PASSWORD: &str = "correct horse battery staple";
pub const OWNER_ADDRESS: &str = "owner@example.com";

/// Postgres-backed tests share one database and truncate it on spawn.
static DATABASE_LOCK: Lazy<Arc<AsyncMutex<()>>> = Lazy::new(|| Arc::new(AsyncMutex::new(())));

/// Keeps every message instead of sending it.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<OutgoingEmail>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    fn owner_address(&self) -> Option<String> {
        Some(OWNER_ADDRESS.to_string())
    }

    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError> {
        self.sent.lock().push(email);
        Ok(())
    }
}

pub struct TestApp {
    pub address: String,
    pub client: Client,
    pub mailer: Arc<RecordingMailer>,
    pub pool: Option<PgPool>,
    _database_guard: Option<OwnedMutexGuard<()>>,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(|_| {}).await
    }

    pub async fn spawn_with(customize: impl FnOnce(&mut AppConfig)) -> Self {
        let mut config = test_config();
        customize(&mut config);
        Self::launch(config, Repositories::memory(MemoryStore::new()), None, None).await
    }

    /// Runs against `TEST_DATABASE_URL` (or `DATABASE_URL`) with migrations
    /// applied and every table emptied. Returns `None` when neither is set.
    pub async fn spawn_postgres() -> Option<Self> {
        let database_url = env::var("TEST_DATABASE_URL")
            .or_else(|_| env::var("DATABASE_URL"))
            .ok()
            .filter(|url| !url.trim().is_empty())?;

        let guard = DATABASE_LOCK.clone().lock_owned().await;

        let pool = create_pool(&database_url)
            .await
            .expect("Failed to create test DB pool");
        run_migrations(&pool).await.expect("Failed to run migrations");
        sqlx::query("TRUNCATE TABLE projects, experiences, achievements, contact_messages")
            .execute(&pool)
            .await
            .expect("Failed to truncate tables");

        let mut config = test_config();
        config.database_url = database_url;
        let repositories = Repositories::postgres(pool.clone());
        Some(Self::launch(config, repositories, Some(pool), Some(guard)).await)
    }

    async fn launch(
        config: AppConfig,
        repositories: Repositories,
        pool: Option<PgPool>,
        database_guard: Option<OwnedMutexGuard<()>>,
    ) -> Self {
        let mailer = Arc::new(RecordingMailer::default());
        let state = web::Data::new(AppState::new(config, repositories, mailer.clone()));

        let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let server = HttpServer::new(move || {
            App::new()
                .wrap(NormalizePath::trim())
                .configure(configure_app(state.clone()))
        })
        .listen(listener)
        .expect("Failed to bind server")
        .workers(1)
        .run();

        tokio::spawn(server);

        let client = Client::new();
        while client.get(format!("{}/health", address)).send().await.is_err() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        TestApp { address, client, mailer, pool, _database_guard: database_guard }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client.get(self.url(path)).send().await.expect("GET failed")
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client.post(self.url(path)).json(body).send().await.expect("POST failed")
    }

    pub async fn admin_token(&self) -> String {
        let response = self
            .post_json("/api/admin/login", &json!({ "password": ADMIN_PASSWORD }))
            .await;
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        let body: Value = response.json().await.unwrap();
        body["access_token"].as_str().expect("token missing").to_string()
    }

    pub async fn admin_get(&self, token: &str, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("admin GET failed")
    }

    pub async fn admin_post(&self, token: &str, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("admin POST failed")
    }

    pub async fn admin_patch(&self, token: &str, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .patch(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("admin PATCH failed")
    }

    pub async fn admin_delete(&self, token: &str, path: &str) -> reqwest::Response {
        self.client
            .delete(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("admin DELETE failed")
    }

    /// Creates a project through the admin API and returns its JSON.
    pub async fn create_project(&self, token: &str, body: &Value) -> Value {
        let response = self.admin_post(token, "/api/admin/projects", body).await;
        assert_eq!(response.status(), reqwest::StatusCode::CREATED);
        let body: Value = response.json().await.unwrap();
        body["data"].clone()
    }
}

fn test_config() -> AppConfig {
    let mut config = AppConfig::testing();
    config.admin_password_hash = Some(hash_password(ADMIN_PASSWORD).expect("hashing failed"));
    config
}

pub fn project_body(title: &str) -> Value {
    json!({
        "title": title,
        "description": "A project description that is long enough to pass validation.",
        "technologies": ["Rust", "PostgreSQL"],
        "category": "Web Development",
        "status": "Completed",
        "priority": 5
    })
}

pub fn contact_body() -> Value {
    json!({
        "name": "Ada Lovelace",
        "email": "ada@example.com",
        "subject": "Backend role",
        "message": "Hi, I would like to talk about a backend engineering position on our team.",
        "category": "Job Opportunity"
    })
}
