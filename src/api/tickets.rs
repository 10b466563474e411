//! Support tickets and contact messages.
//!
//! Submission is public. Support submissions made with a valid token are
//! tied to the caller's email so they show up under `/api/suporte/minhas`.
//! Everything else here is administrator territory.

use super::{
    deleted, found, not_found, AppState, IdParam, IdPath, JsonBody, QueryParams, StatusUpdate,
};
use crate::auth::models::Claims;
use crate::error::ApiError;
use crate::store::tickets::{
    Contact, ContactFilter, ContactInput, SupportTicket, TicketFilter, TicketInput,
    CONTACT_STATUSES, TICKET_STATUSES,
};
use crate::validation::{normalize_email, one_of, optional_text, require_text, validate_email};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use axum_extra::extract::WithRejection;
use serde_json::Value;
use tracing::info;

/// POST /api/suporte (optional auth)
pub async fn create_ticket(
    State(state): State<AppState>,
    claims: Option<Extension<Claims>>,
    WithRejection(Json(input), _): JsonBody<TicketInput>,
) -> Result<(StatusCode, Json<SupportTicket>), ApiError> {
    require_text("nome", &input.nome, 100)?;
    validate_email("email", &input.email)?;
    require_text("mensagem", &input.mensagem, 5000)?;
    optional_text("tipo_interacao", input.tipo_interacao.as_deref(), 50)?;

    let cliente_email = claims.map(|Extension(c)| normalize_email(&c.email));
    let ticket = state.db.create_ticket(&input, cliente_email.as_deref())?;

    info!(
        "🎫 Support ticket {} opened ({})",
        ticket.id, ticket.tipo_interacao
    );
    Ok((StatusCode::CREATED, Json(ticket)))
}

/// GET /api/suporte/minhas (Authenticated)
pub async fn list_my_tickets(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<SupportTicket>>, ApiError> {
    let filter = TicketFilter {
        cliente_email: Some(normalize_email(&claims.email)),
        ..Default::default()
    };
    Ok(Json(state.db.list_tickets(&filter)?))
}

/// GET /api/suporte (Admin only)
pub async fn list_tickets(
    State(state): State<AppState>,
    WithRejection(Query(filter), _): QueryParams<TicketFilter>,
) -> Result<Json<Vec<SupportTicket>>, ApiError> {
    Ok(Json(state.db.list_tickets(&filter)?))
}

/// GET /api/suporte/:id (Admin only)
pub async fn get_ticket(
    State(state): State<AppState>,
    WithRejection(Path(IdPath { id }), _): IdParam,
) -> Result<Json<SupportTicket>, ApiError> {
    found(state.db.get_ticket(id)?, "Support ticket", id)
}

/// PUT /api/suporte/:id/status (Admin only)
pub async fn update_ticket_status(
    State(state): State<AppState>,
    WithRejection(Path(IdPath { id }), _): IdParam,
    WithRejection(Json(update), _): JsonBody<StatusUpdate>,
) -> Result<Json<SupportTicket>, ApiError> {
    let status = update.status.trim();
    one_of("status", status, TICKET_STATUSES)?;
    if !state.db.update_ticket_status(id, status)? {
        return Err(not_found("Support ticket", id));
    }
    found(state.db.get_ticket(id)?, "Support ticket", id)
}

/// DELETE /api/suporte/:id (Admin only)
pub async fn delete_ticket(
    State(state): State<AppState>,
    WithRejection(Path(IdPath { id }), _): IdParam,
) -> Result<Json<Value>, ApiError> {
    if !state.db.delete_ticket(id)? {
        return Err(not_found("Support ticket", id));
    }
    Ok(deleted("Support ticket", id))
}

/// POST /api/contatos
pub async fn create_contact(
    State(state): State<AppState>,
    WithRejection(Json(input), _): JsonBody<ContactInput>,
) -> Result<(StatusCode, Json<Contact>), ApiError> {
    require_text("nome", &input.nome, 100)?;
    validate_email("email", &input.email)?;
    require_text("mensagem", &input.mensagem, 5000)?;

    let contact = state.db.create_contact(&input)?;
    info!("✉️ Contact {} received", contact.id);
    Ok((StatusCode::CREATED, Json(contact)))
}

/// GET /api/contatos (Admin only)
pub async fn list_contacts(
    State(state): State<AppState>,
    WithRejection(Query(filter), _): QueryParams<ContactFilter>,
) -> Result<Json<Vec<Contact>>, ApiError> {
    Ok(Json(state.db.list_contacts(&filter)?))
}

/// GET /api/contatos/:id (Admin only)
pub async fn get_contact(
    State(state): State<AppState>,
    WithRejection(Path(IdPath { id }), _): IdParam,
) -> Result<Json<Contact>, ApiError> {
    found(state.db.get_contact(id)?, "Contact", id)
}

/// PUT /api/contatos/:id/status (Admin only)
pub async fn update_contact_status(
    State(state): State<AppState>,
    WithRejection(Path(IdPath { id }), _): IdParam,
    WithRejection(Json(update), _): JsonBody<StatusUpdate>,
) -> Result<Json<Contact>, ApiError> {
    let status = update.status.trim();
    one_of("status", status, CONTACT_STATUSES)?;
    if !state.db.update_contact_status(id, status)? {
        return Err(not_found("Contact", id));
    }
    found(state.db.get_contact(id)?, "Contact", id)
}

/// DELETE /api/contatos/:id (Admin only)
pub async fn delete_contact(
    State(state): State<AppState>,
    WithRejection(Path(IdPath { id }), _): IdParam,
) -> Result<Json<Value>, ApiError> {
    if !state.db.delete_contact(id)? {
        return Err(not_found("Contact", id));
    }
    Ok(deleted("Contact", id))
}
