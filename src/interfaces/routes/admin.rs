use actix_web::web;

use crate::{
    handlers::{achievements, auth, contact, experiences, projects},
    middlewares::auth::AdminGuard,
};

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    // Login sits outside the guarded scope and must be registered first.
    cfg.service(
        web::resource("/admin/login")
            .route(web::post().to(auth::login))
    );

    cfg.service(
        web::scope("/admin")
            .wrap(AdminGuard)
            .service(
                web::resource("/projects")
                    .route(web::post().to(projects::create_project))
            )
            .service(
                web::resource("/projects/{project_id}")
                    .route(web::patch().to(projects::update_project))
                    .route(web::delete().to(projects::delete_project))
            )
            .service(
                web::resource("/projects/{project_id}/toggle-featured")
                    .route(web::post().to(projects::toggle_project_featured))
            )
            .service(
                web::resource("/experiences")
                    .route(web::post().to(experiences::create_experience))
            )
            .service(
                web::resource("/achievements")
                    .route(web::post().to(achievements::create_achievement))
            )
            .service(
                web::resource("/achievements/{achievement_id}/toggle-featured")
                    .route(web::post().to(achievements::toggle_achievement_featured))
            )
            .service(
                web::resource("/contacts")
                    .route(web::get().to(contact::list_contacts))
            )
            .service(
                web::resource("/contacts/unread")
                    .route(web::get().to(contact::unread_contacts))
            )
            .service(
                web::resource("/contacts/urgent")
                    .route(web::get().to(contact::urgent_contacts))
            )
            .service(
                web::resource("/contacts/{contact_id}")
                    .route(web::get().to(contact::get_contact))
            )
            .service(
                web::resource("/contacts/{contact_id}/archive")
                    .route(web::post().to(contact::archive_contact))
            )
            .service(
                web::resource("/contacts/{contact_id}/notes")
                    .route(web::post().to(contact::add_contact_note))
            )
            .service(
                web::resource("/contacts/{contact_id}/{action}")
                    .route(web::post().to(contact::change_contact_status))
            )
    );
}
