use actix_web::{web, HttpResponse, Responder};
use tracing::instrument;

use crate::{
    entities::{experience::NewExperienceRequest, pagination::DataResponse},
    errors::AppError,
    repositories::experience::ExperienceFilter,
    use_cases::extractors::AdminClaims,
    AppState,
};

async fn respond(state: &AppState, filter: ExperienceFilter) -> Result<HttpResponse, AppError> {
    let experiences = state.experience_handler.list(filter).await?;
    Ok(HttpResponse::Ok().json(DataResponse::counted(experiences)))
}

#[instrument(skip(state))]
pub async fn list_experiences(state: web::Data<AppState>) -> Result<impl Responder, AppError> {
    respond(&state, ExperienceFilter::All).await
}

#[instrument(skip(state))]
pub async fn current_experiences(state: web::Data<AppState>) -> Result<impl Responder, AppError> {
    respond(&state, ExperienceFilter::Current).await
}

#[instrument(skip(state))]
pub async fn work_experiences(state: web::Data<AppState>) -> Result<impl Responder, AppError> {
    respond(&state, ExperienceFilter::work()).await
}

#[instrument(skip(state))]
pub async fn education(state: web::Data<AppState>) -> Result<impl Responder, AppError> {
    respond(&state, ExperienceFilter::education()).await
}

#[instrument(skip(state))]
pub async fn experiences_by_type(
    state: web::Data<AppState>,
    kind: web::Path<String>,
) -> Result<impl Responder, AppError> {
    let experiences = state.experience_handler.list_by_type(&kind).await?;
    Ok(HttpResponse::Ok().json(DataResponse::counted(experiences)))
}

#[instrument(skip(_claims, state, data))]
pub async fn create_experience(
    _claims: AdminClaims,
    state: web::Data<AppState>,
    data: web::Json<NewExperienceRequest>,
) -> Result<impl Responder, AppError> {
    let experience = state.experience_handler.create(data.into_inner()).await?;
    Ok(HttpResponse::Created().json(DataResponse::new(experience)))
}
