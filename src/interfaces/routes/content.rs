use actix_web::web;

use crate::handlers::{achievements, experiences};

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/experiences")
            .service(
                web::resource("")
                    .route(web::get().to(experiences::list_experiences))
            )
            .service(
                web::resource("/current")
                    .route(web::get().to(experiences::current_experiences))
            )
            .service(
                web::resource("/work")
                    .route(web::get().to(experiences::work_experiences))
            )
            .service(
                web::resource("/education")
                    .route(web::get().to(experiences::education))
            )
            .service(
                web::resource("/type/{kind}")
                    .route(web::get().to(experiences::experiences_by_type))
            )
    );

    cfg.service(
        web::scope("/achievements")
            .service(
                web::resource("")
                    .route(web::get().to(achievements::list_achievements))
            )
            .service(
                web::resource("/featured")
                    .route(web::get().to(achievements::featured_achievements))
            )
            .service(
                web::resource("/certifications")
                    .route(web::get().to(achievements::certifications))
            )
            .service(
                web::resource("/awards")
                    .route(web::get().to(achievements::awards))
            )
            .service(
                web::resource("/recent")
                    .route(web::get().to(achievements::recent_achievements))
            )
            .service(
                web::resource("/type/{kind}")
                    .route(web::get().to(achievements::achievements_by_type))
            )
    );
}
