use actix_web::{web, HttpResponse, Responder};
use tracing::instrument;

use crate::{
    entities::{
        pagination::DataResponse,
        project::{NewProjectRequest, UpdateProjectRequest},
    },
    errors::AppError,
    query::ProjectListParams,
    use_cases::extractors::AdminClaims,
    AppState,
};

#[instrument(skip(state, query))]
pub async fn list_projects(
    state: web::Data<AppState>,
    query: web::Query<ProjectListParams>,
) -> Result<impl Responder, AppError> {
    let response = state.project_handler.list(query.into_inner()).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[instrument(skip(state))]
pub async fn featured_projects(state: web::Data<AppState>) -> Result<impl Responder, AppError> {
    let projects = state.project_handler.featured().await?;
    Ok(HttpResponse::Ok().json(DataResponse::counted(projects)))
}

#[instrument(skip(state))]
pub async fn project_categories(state: web::Data<AppState>) -> Result<impl Responder, AppError> {
    let groups = state.project_handler.categories().await?;
    Ok(HttpResponse::Ok().json(DataResponse::new(groups)))
}

#[instrument(skip(state))]
pub async fn project_stats(state: web::Data<AppState>) -> Result<impl Responder, AppError> {
    let stats = state.project_handler.stats().await?;
    Ok(HttpResponse::Ok().json(DataResponse::new(stats)))
}

#[instrument(skip(state))]
pub async fn get_project(
    state: web::Data<AppState>,
    project_id: web::Path<String>,
) -> Result<impl Responder, AppError> {
    let project = state.project_handler.view_by_id(&project_id).await?;
    Ok(HttpResponse::Ok().json(DataResponse::new(project)))
}

#[instrument(skip(state))]
pub async fn get_project_by_slug(
    state: web::Data<AppState>,
    slug: web::Path<String>,
) -> Result<impl Responder, AppError> {
    let project = state.project_handler.view_by_slug(&slug).await?;
    Ok(HttpResponse::Ok().json(DataResponse::new(project)))
}

#[instrument(skip(state))]
pub async fn like_project(
    state: web::Data<AppState>,
    project_id: web::Path<String>,
) -> Result<impl Responder, AppError> {
    let likes = state.project_handler.like(&project_id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Project liked successfully",
        "data": likes,
    })))
}

#[instrument(skip(_claims, state, data))]
pub async fn create_project(
    _claims: AdminClaims,
    state: web::Data<AppState>,
    data: web::Json<NewProjectRequest>,
) -> Result<impl Responder, AppError> {
    let project = state
        .project_handler
        .create(data.into_inner(), &state.config.owner_name)
        .await?;
    Ok(HttpResponse::Created().json(DataResponse::new(project)))
}

#[instrument(skip(_claims, state, data))]
pub async fn update_project(
    _claims: AdminClaims,
    state: web::Data<AppState>,
    project_id: web::Path<String>,
    data: web::Json<UpdateProjectRequest>,
) -> Result<impl Responder, AppError> {
    let project = state.project_handler.update(&project_id, data.into_inner()).await?;
    Ok(HttpResponse::Ok().json(DataResponse::new(project)))
}

#[instrument(skip(_claims, state))]
pub async fn toggle_project_featured(
    _claims: AdminClaims,
    state: web::Data<AppState>,
    project_id: web::Path<String>,
) -> Result<impl Responder, AppError> {
    let project = state.project_handler.toggle_featured(&project_id).await?;
    Ok(HttpResponse::Ok().json(DataResponse::new(project)))
}

#[instrument(skip(_claims, state))]
pub async fn delete_project(
    _claims: AdminClaims,
    state: web::Data<AppState>,
    project_id: web::Path<String>,
) -> Result<impl Responder, AppError> {
    state.project_handler.delete(&project_id).await?;
    Ok(HttpResponse::NoContent().finish())
}
