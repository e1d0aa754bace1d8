use actix_web::{get, web, HttpResponse, Responder};
use chrono::Utc;
use humantime::format_duration;
use serde::Serialize;
use std::time::Duration;

use crate::{constants::START_TIME, AppState};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthCheckResponse {
    status: &'static str,
    timestamp: String,
    uptime: String,
    uptime_seconds: i64,
    environment: String,
    version: &'static str,
    storage: &'static str,
    database: &'static str,
}

#[get("/health")]
pub async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let now_utc = Utc::now();
    let uptime_seconds = now_utc.signed_duration_since(*START_TIME).num_seconds().max(0);
    let human_uptime = format_duration(Duration::from_secs(uptime_seconds as u64));

    let database = match state.project_handler.ping().await {
        Ok(()) => "OK",
        Err(e) => {
            tracing::warn!(error = %e, "Storage health check failed");
            "Unavailable"
        }
    };

    HttpResponse::Ok().json(HealthCheckResponse {
        status: "OK",
        timestamp: now_utc.to_rfc3339(),
        uptime: human_uptime.to_string(),
        uptime_seconds,
        environment: state.config.env.to_string(),
        version: env!("CARGO_PKG_VERSION"),
        storage: state.storage.as_str(),
        database,
    })
}
