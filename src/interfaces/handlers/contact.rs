use actix_web::{http::header, web, HttpRequest, HttpResponse, Responder};
use tracing::instrument;

use crate::{
    entities::{
        contact::{ContactForm, NoteRequest, RequestMeta, StatusAction},
        pagination::{DataResponse, PaginatedResponse},
    },
    errors::AppError,
    query::{ContactListParams, ContactListQuery},
    use_cases::{contact::Submission, extractors::AdminClaims},
    utils::get_client_ip::get_client_ip,
    AppState,
};

fn header_value(req: &HttpRequest, name: header::HeaderName) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn request_meta(req: &HttpRequest, trust_x_forwarded_for: bool) -> RequestMeta {
    RequestMeta {
        ip_address: Some(get_client_ip(req, trust_x_forwarded_for)),
        user_agent: header_value(req, header::USER_AGENT),
        referrer: header_value(req, header::REFERER),
    }
}

#[instrument(skip(req, state, form))]
pub async fn submit_contact(
    req: HttpRequest,
    state: web::Data<AppState>,
    form: web::Json<ContactForm>,
) -> Result<impl Responder, AppError> {
    let meta = request_meta(&req, state.config.trust_x_forwarded_for);

    let response = match state.contact_handler.submit(form.into_inner(), meta).await? {
        Submission::Flagged(receipt) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "message": "Thank you for your message. We'll get back to you soon!",
            "data": receipt,
        })),
        Submission::Received(receipt) => HttpResponse::Created().json(serde_json::json!({
            "success": true,
            "message": "Thank you for your message! I'll get back to you soon.",
            "data": receipt,
        })),
    };
    Ok(response)
}

#[instrument(skip(state))]
pub async fn contact_stats(state: web::Data<AppState>) -> Result<impl Responder, AppError> {
    let stats = state.contact_handler.stats().await?;
    Ok(HttpResponse::Ok().json(DataResponse::new(stats)))
}

#[instrument(skip(_claims, state, query))]
pub async fn list_contacts(
    _claims: AdminClaims,
    state: web::Data<AppState>,
    query: web::Query<ContactListParams>,
) -> Result<impl Responder, AppError> {
    let query = ContactListQuery::try_from(query.into_inner())?;
    let page = state.contact_handler.list(query.filter, query.page).await?;

    let echo = serde_json::json!({ "status": query.filter.status });
    Ok(HttpResponse::Ok().json(PaginatedResponse::new(page, query.page, echo)))
}

#[instrument(skip(_claims, state))]
pub async fn unread_contacts(
    _claims: AdminClaims,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let messages = state.contact_handler.unread().await?;
    Ok(HttpResponse::Ok().json(DataResponse::counted(messages)))
}

#[instrument(skip(_claims, state))]
pub async fn urgent_contacts(
    _claims: AdminClaims,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let messages = state.contact_handler.urgent().await?;
    Ok(HttpResponse::Ok().json(DataResponse::counted(messages)))
}

#[instrument(skip(_claims, state))]
pub async fn get_contact(
    _claims: AdminClaims,
    state: web::Data<AppState>,
    contact_id: web::Path<String>,
) -> Result<impl Responder, AppError> {
    let message = state.contact_handler.get(&contact_id).await?;
    Ok(HttpResponse::Ok().json(DataResponse::new(message)))
}

#[instrument(skip(_claims, state))]
pub async fn change_contact_status(
    _claims: AdminClaims,
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> Result<impl Responder, AppError> {
    let (contact_id, action) = path.into_inner();
    let action = action
        .parse::<StatusAction>()
        .map_err(|_| AppError::NotFound(format!("Unknown contact action '{}'", action)))?;

    let message = state.contact_handler.transition(&contact_id, action).await?;
    Ok(HttpResponse::Ok().json(DataResponse::new(message)))
}

#[instrument(skip(_claims, state))]
pub async fn archive_contact(
    _claims: AdminClaims,
    state: web::Data<AppState>,
    contact_id: web::Path<String>,
) -> Result<impl Responder, AppError> {
    let message = state.contact_handler.archive(&contact_id).await?;
    Ok(HttpResponse::Ok().json(DataResponse::new(message)))
}

#[instrument(skip(_claims, state, note))]
pub async fn add_contact_note(
    _claims: AdminClaims,
    state: web::Data<AppState>,
    contact_id: web::Path<String>,
    note: web::Json<NoteRequest>,
) -> Result<impl Responder, AppError> {
    let message = state.contact_handler.add_note(&contact_id, note.into_inner()).await?;
    Ok(HttpResponse::Created().json(DataResponse::new(message)))
}
