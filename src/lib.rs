use std::{sync::Arc, time::Duration};

use actix_web::web;

mod domain;
mod interfaces;
mod infrastructure;
pub mod errors;
pub mod settings;
pub mod constants;
pub mod graceful_shutdown;
pub mod background_task;

pub use domain::{entities, query, use_cases};
pub use interfaces::{handlers, repositories, middlewares, routes};
pub use infrastructure::{auth, db, limiter, mail, memory, seed, utils};

use auth::jwt::JwtService;
use limiter::rate_limiter::RateLimiterStore;
use mail::Mailer;
use memory::MemoryStore;
use repositories::{
    achievement::AchievementRepository,
    contact::ContactRepository,
    experience::ExperienceRepository,
    project::ProjectRepository,
    sqlx_repo::{SqlxAchievementRepo, SqlxContactRepo, SqlxExperienceRepo, SqlxProjectRepo},
    token::TokenServiceRepository,
};
use settings::AppConfig;
use use_cases::{
    achievements::AchievementHandler,
    auth::AuthHandler,
    contact::{ContactHandler, Notifier},
    experiences::ExperienceHandler,
    projects::ProjectHandler,
};

/// Which backend the repositories talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Postgres,
    Memory,
}

impl StorageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKind::Postgres => "postgres",
            StorageKind::Memory => "memory",
        }
    }
}

/// One handle per repository trait, all backed by the same store.
#[derive(Clone)]
pub struct Repositories {
    pub projects: Arc<dyn ProjectRepository>,
    pub experiences: Arc<dyn ExperienceRepository>,
    pub achievements: Arc<dyn AchievementRepository>,
    pub contacts: Arc<dyn ContactRepository>,
    pub kind: StorageKind,
}

impl Repositories {
    pub fn postgres(pool: sqlx::PgPool) -> Self {
        Repositories {
            projects: Arc::new(SqlxProjectRepo { pool: pool.clone() }),
            experiences: Arc::new(SqlxExperienceRepo { pool: pool.clone() }),
            achievements: Arc::new(SqlxAchievementRepo { pool: pool.clone() }),
            contacts: Arc::new(SqlxContactRepo { pool }),
            kind: StorageKind::Postgres,
        }
    }

    pub fn memory(store: MemoryStore) -> Self {
        Repositories {
            projects: Arc::new(store.clone()),
            experiences: Arc::new(store.clone()),
            achievements: Arc::new(store.clone()),
            contacts: Arc::new(store),
            kind: StorageKind::Memory,
        }
    }
}

pub struct AppState {
    pub config: AppConfig,
    pub storage: StorageKind,
    pub auth_handler: AppAuthHandler,
    pub project_handler: ProjectHandler,
    pub experience_handler: ExperienceHandler,
    pub achievement_handler: AchievementHandler,
    pub contact_handler: ContactHandler,
    pub api_limiter: RateLimiterStore,
    pub contact_limiter: RateLimiterStore,
}

pub type AppAuthHandler = AuthHandler<dyn TokenServiceRepository>;

impl AppState {
    pub fn new(config: AppConfig, repos: Repositories, mailer: Arc<dyn Mailer>) -> Self {
        let token_service: Box<dyn TokenServiceRepository> = Box::new(JwtService::new(&config));
        let auth_handler = AuthHandler::new(token_service, config.admin_password_hash.clone());

        let notifier = Notifier {
            mailer,
            owner_name: config.owner_name.clone(),
            site_url: config.site_url.clone(),
            wait: Duration::from_millis(config.email_wait_ms),
        };

        let api_limiter = RateLimiterStore::new(
            config.api_rate_limit,
            Duration::from_secs(config.api_rate_window_secs),
        );
        let contact_limiter = RateLimiterStore::new(
            config.contact_rate_limit,
            Duration::from_secs(config.contact_rate_window_secs),
        );

        AppState {
            storage: repos.kind,
            auth_handler,
            project_handler: ProjectHandler::new(repos.projects),
            experience_handler: ExperienceHandler::new(repos.experiences),
            achievement_handler: AchievementHandler::new(repos.achievements),
            contact_handler: ContactHandler::new(repos.contacts, notifier),
            api_limiter,
            contact_limiter,
            config,
        }
    }
}

/// Installs shared state, extractor error handlers and every route.
pub fn configure_app(state: web::Data<AppState>) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        routes::configure_routes(cfg, &state);
        cfg.app_data(state);
    }
}
