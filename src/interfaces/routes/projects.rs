use actix_web::web;

use crate::handlers::projects;

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/projects")
            .service(
                web::resource("")
                    .route(web::get().to(projects::list_projects))
            )
            .service(
                web::resource("/featured")
                    .route(web::get().to(projects::featured_projects))
            )
            .service(
                web::resource("/categories")
                    .route(web::get().to(projects::project_categories))
            )
            .service(
                web::resource("/stats")
                    .route(web::get().to(projects::project_stats))
            )
            .service(
                web::resource("/slug/{slug}")
                    .route(web::get().to(projects::get_project_by_slug))
            )
            .service(
                web::resource("/{project_id}")
                    .route(web::get().to(projects::get_project))
            )
            .service(
                web::resource("/{project_id}/like")
                    .route(web::post().to(projects::like_project))
            )
    );
}
