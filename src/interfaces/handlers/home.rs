use actix_web::{get, HttpRequest, HttpResponse, Responder};

use crate::constants::SERVICE_NAME;

/// Public endpoints advertised by the banner and the 404 body.
pub const ENDPOINTS: &[&str] = &[
    "GET /health",
    "GET /api/projects",
    "GET /api/projects/featured",
    "GET /api/projects/categories",
    "GET /api/projects/stats",
    "GET /api/projects/{id}",
    "GET /api/projects/slug/{slug}",
    "POST /api/projects/{id}/like",
    "POST /api/contact",
    "GET /api/contact/stats",
    "GET /api/experiences",
    "GET /api/experiences/current",
    "GET /api/experiences/work",
    "GET /api/experiences/education",
    "GET /api/experiences/type/{type}",
    "GET /api/achievements",
    "GET /api/achievements/featured",
    "GET /api/achievements/certifications",
    "GET /api/achievements/awards",
    "GET /api/achievements/recent",
    "GET /api/achievements/type/{type}",
    "POST /api/admin/login",
];

#[get("/")]
pub async fn home() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": format!("Welcome to the {}", SERVICE_NAME),
        "status": "Ok",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": ENDPOINTS,
    }))
}

pub async fn not_found(req: HttpRequest) -> impl Responder {
    tracing::debug!(method = %req.method(), path = %req.path(), "No route matched");
    HttpResponse::NotFound().json(serde_json::json!({
        "success": false,
        "error": "Not Found",
        "message": format!("Route {} {} not found", req.method(), req.path()),
        "availableEndpoints": ENDPOINTS,
    }))
}
