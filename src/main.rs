use std::{sync::Arc, time::Duration};

use actix_cors::Cors;
use actix_web::{http::header, middleware::NormalizePath, web, App, HttpServer};
use portfolio_api::{
    background_task::start_archive_task,
    configure_app,
    constants::{SERVICE_NAME, START_TIME},
    db::postgres::{create_pool, run_migrations},
    errors::expose_internal_details,
    graceful_shutdown::shutdown_signal,
    mail::mailer_from_config,
    memory::MemoryStore,
    seed::SeedData,
    settings::{AppConfig, LogFormat},
    AppState, Repositories,
};
use once_cell::sync::Lazy;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::EnvFilter;

const LIMITER_EVICTION_INTERVAL: Duration = Duration::from_secs(60);

fn init_tracing(format: &LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

fn build_cors(config: &AppConfig) -> Cors {
    let origins = config.cors_origins();
    let cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "PATCH", "DELETE", "OPTIONS"])
        .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .max_age(3600);

    if origins.iter().any(|o| o == "*") {
        return cors.allow_any_origin();
    }
    origins
        .iter()
        .fold(cors, |cors, origin| cors.allowed_origin(origin))
        .supports_credentials()
}

async fn open_storage(config: &AppConfig) -> Result<Repositories, String> {
    if config.uses_database() {
        let pool = create_pool(&config.database_url)
            .await
            .map_err(|e| format!("Failed to create database connection pool: {}", e))?;
        run_migrations(&pool)
            .await
            .map_err(|e| format!("Failed to run database migrations: {}", e))?;
        return Ok(Repositories::postgres(pool));
    }

    tracing::warn!("DATABASE_URL not set, using the in-memory store. Data is lost on restart.");
    let repos = Repositories::memory(MemoryStore::new());

    if let Some(path) = config.seed_path.as_deref() {
        let seed = SeedData::from_path(path).map_err(|e| format!("{:#}", e))?;
        seed.load(
            &config.owner_name,
            repos.projects.as_ref(),
            repos.experiences.as_ref(),
            repos.achievements.as_ref(),
        )
        .await
        .map_err(|e| format!("Failed to seed in-memory store: {}", e))?;
    }
    Ok(repos)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let config = match AppConfig::new() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    init_tracing(&config.log_format);
    Lazy::force(&START_TIME);
    tracing::info!("Loaded configuration: {:?}", config);
    expose_internal_details(!config.is_production());

    let repos = match open_storage(&config).await {
        Ok(repos) => repos,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };

    let mailer = Arc::from(mailer_from_config(&config));
    let contacts = Arc::clone(&repos.contacts);
    let app_state = web::Data::new(AppState::new(config.clone(), repos, mailer));

    app_state.api_limiter.start_eviction(LIMITER_EVICTION_INTERVAL);
    app_state.contact_limiter.start_eviction(LIMITER_EVICTION_INTERVAL);
    tokio::spawn(start_archive_task(contacts, config.archive_after_days));

    let server_addr = format!("{}:{}", config.host, config.port);

    tracing::info!(
        storage = app_state.storage.as_str(),
        "🚀 Starting {} v{} on {}",
        SERVICE_NAME,
        env!("CARGO_PKG_VERSION"),
        server_addr
    );

    let cors_config = config.clone();
    let server = HttpServer::new(move || {
        App::new()
            .wrap(NormalizePath::trim())
            .wrap(build_cors(&cors_config))
            .wrap(TracingLogger::default())
            .configure(configure_app(app_state.clone()))
    })
    .workers(config.worker_count.max(1))
    .bind(server_addr)?
    .run();

    tokio::select! {
        res = server => res,
        _ = shutdown_signal() => Ok(()),
    }
}
