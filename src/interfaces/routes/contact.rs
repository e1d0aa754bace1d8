use actix_web::web;

use crate::{handlers::contact, middlewares::rate_limit::RateLimit};

/// Public contact routes. `submission_limit` applies to form submissions only.
pub fn config_routes(cfg: &mut web::ServiceConfig, submission_limit: RateLimit) {
    cfg.service(
        web::scope("/contact")
            .service(
                web::resource("")
                    .wrap(submission_limit)
                    .route(web::post().to(contact::submit_contact))
            )
            .service(
                web::resource("/stats")
                    .route(web::get().to(contact::contact_stats))
            )
    );
}
