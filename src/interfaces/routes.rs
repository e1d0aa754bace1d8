use actix_web::web;

use crate::{
    handlers::{home, system::health_check},
    middlewares::rate_limit::RateLimit,
    AppState,
};

mod admin;
mod content;
mod contact;
mod json_error;
mod projects;

/// Registers every route. Rate limiters come from the shared state so all
/// workers count against the same buckets.
pub fn configure_routes(cfg: &mut web::ServiceConfig, state: &AppState) {
    let trust_xff = state.config.trust_x_forwarded_for;

    cfg.configure(json_error::config_routes);
    cfg.service(home::home);
    cfg.service(health_check);

    cfg.service(
        web::scope("/api")
            .wrap(RateLimit::new(state.api_limiter.clone(), trust_xff))
            .configure(projects::config_routes)
            .configure(|cfg| contact::config_routes(cfg, RateLimit::new(state.contact_limiter.clone(), trust_xff)))
            .configure(content::config_routes)
            .configure(admin::config_routes)
    );

    cfg.default_service(web::route().to(home::not_found));
}
