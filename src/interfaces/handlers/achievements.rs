use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;
use tracing::instrument;

use crate::{
    entities::{achievement::NewAchievementRequest, pagination::DataResponse},
    errors::AppError,
    repositories::achievement::AchievementFilter,
    use_cases::extractors::AdminClaims,
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct RecentParams {
    limit: Option<String>,
}

async fn respond(state: &AppState, filter: AchievementFilter) -> Result<HttpResponse, AppError> {
    let achievements = state.achievement_handler.list(filter).await?;
    Ok(HttpResponse::Ok().json(DataResponse::counted(achievements)))
}

#[instrument(skip(state))]
pub async fn list_achievements(state: web::Data<AppState>) -> Result<impl Responder, AppError> {
    respond(&state, AchievementFilter::All).await
}

#[instrument(skip(state))]
pub async fn featured_achievements(state: web::Data<AppState>) -> Result<impl Responder, AppError> {
    respond(&state, AchievementFilter::Featured).await
}

#[instrument(skip(state))]
pub async fn certifications(state: web::Data<AppState>) -> Result<impl Responder, AppError> {
    respond(&state, AchievementFilter::certifications()).await
}

#[instrument(skip(state))]
pub async fn awards(state: web::Data<AppState>) -> Result<impl Responder, AppError> {
    respond(&state, AchievementFilter::awards()).await
}

#[instrument(skip(state, query))]
pub async fn recent_achievements(
    state: web::Data<AppState>,
    query: web::Query<RecentParams>,
) -> Result<impl Responder, AppError> {
    let limit = match query.limit.as_deref() {
        None => None,
        Some(raw) => Some(
            raw.trim()
                .parse::<i64>()
                .map_err(|_| AppError::validation("limit", "Limit must be an integer"))?,
        ),
    };
    let achievements = state.achievement_handler.recent(limit).await?;
    Ok(HttpResponse::Ok().json(DataResponse::counted(achievements)))
}

#[instrument(skip(state))]
pub async fn achievements_by_type(
    state: web::Data<AppState>,
    kind: web::Path<String>,
) -> Result<impl Responder, AppError> {
    let achievements = state.achievement_handler.list_by_type(&kind).await?;
    Ok(HttpResponse::Ok().json(DataResponse::counted(achievements)))
}

#[instrument(skip(_claims, state, data))]
pub async fn create_achievement(
    _claims: AdminClaims,
    state: web::Data<AppState>,
    data: web::Json<NewAchievementRequest>,
) -> Result<impl Responder, AppError> {
    let achievement = state.achievement_handler.create(data.into_inner()).await?;
    Ok(HttpResponse::Created().json(DataResponse::new(achievement)))
}

#[instrument(skip(_claims, state))]
pub async fn toggle_achievement_featured(
    _claims: AdminClaims,
    state: web::Data<AppState>,
    achievement_id: web::Path<String>,
) -> Result<impl Responder, AppError> {
    let achievement = state.achievement_handler.toggle_featured(&achievement_id).await?;
    Ok(HttpResponse::Ok().json(DataResponse::new(achievement)))
}
