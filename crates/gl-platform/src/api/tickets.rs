//! Ticket API Endpoints
//!
//! - GET /:id - Fetch a ticket
//! - POST /generate - Issue a signed ticket for a guest
//! - POST /validate - Scan a ticket for check-in
//! - POST /:id/revoke - Administratively revoke a ticket

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use gl_auth::{AuthIdentity, TicketSigner};
use gl_common::{Event, Guest, Ticket, UserRole};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::common::SuccessResponse;
use crate::api::middleware::Authenticated;
use crate::error::PlatformError;
use crate::repository::{EventRepository, GuestRepository, TicketRepository};
use crate::service::{rules, TicketValidationService};

/// Ticket validation request (a scanned QR code)
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidateTicketRequest {
    /// The QR payload string
    pub qr_code: String,

    /// The detached base64 signature
    pub signature: String,
}

/// Ticket validation result
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidateTicketResponse {
    pub is_valid: bool,
    pub already_validated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket: Option<Ticket>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guest: Option<Guest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<Event>,
}

/// Ticket generation request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateTicketRequest {
    /// The guest to issue a ticket for
    pub guest_id: Uuid,
}

/// Tickets service state
#[derive(Clone)]
pub struct TicketsState {
    pub validation: Arc<TicketValidationService>,
    pub tickets: Arc<dyn TicketRepository>,
    pub guests: Arc<dyn GuestRepository>,
    pub events: Arc<dyn EventRepository>,
    pub signer: TicketSigner,
}

pub(crate) fn require_role(
    identity: &AuthIdentity,
    roles: &[UserRole],
) -> Result<(), PlatformError> {
    if identity.has_any_role(roles) {
        Ok(())
    } else {
        Err(PlatformError::forbidden(
            "Insufficient role for this operation",
        ))
    }
}

impl TicketsState {
    /// Load a ticket scoped to the caller's venue. A foreign ticket reports
    /// the same not-found as an absent one.
    async fn find_scoped(
        &self,
        ticket_id: Uuid,
        identity: &AuthIdentity,
    ) -> Result<Ticket, PlatformError> {
        let not_found = || PlatformError::not_found("Ticket", ticket_id.to_string());

        let ticket = self
            .tickets
            .find_by_id(ticket_id)
            .await?
            .ok_or_else(not_found)?;
        match self.events.find_by_id(ticket.event_id).await? {
            Some(event) if event.venue_id == identity.venue_id => Ok(ticket),
            _ => Err(not_found()),
        }
    }
}

/// Fetch a ticket by id
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "tickets",
    params(("id" = Uuid, Path, description = "Ticket id")),
    responses(
        (status = 200, description = "The ticket", body = Ticket),
        (status = 404, description = "Ticket not found"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn get_ticket(
    State(state): State<TicketsState>,
    auth: Authenticated,
    Path(id): Path<Uuid>,
) -> Result<Json<Ticket>, PlatformError> {
    let ticket = state.find_scoped(id, &auth.0).await?;
    Ok(Json(ticket))
}

/// Issue a signed ticket for a guest
///
/// Idempotent per guest: if the guest already holds a valid ticket, that
/// ticket is returned instead of minting a second one.
#[utoipa::path(
    post,
    path = "/generate",
    tag = "tickets",
    request_body = GenerateTicketRequest,
    responses(
        (status = 200, description = "The guest's ticket", body = Ticket),
        (status = 400, description = "Event not open for ticketing"),
        (status = 403, description = "Insufficient role"),
        (status = 404, description = "Guest not found")
    )
)]
pub async fn generate_ticket(
    State(state): State<TicketsState>,
    auth: Authenticated,
    Json(req): Json<GenerateTicketRequest>,
) -> Result<Json<Ticket>, PlatformError> {
    let identity = auth.0;
    require_role(&identity, &[UserRole::Owner, UserRole::Admin, UserRole::Staff])?;

    let not_found = || PlatformError::not_found("Guest", req.guest_id.to_string());
    let guest = state
        .guests
        .find_by_id(req.guest_id)
        .await?
        .ok_or_else(not_found)?;

    let event = match state.events.find_by_id(guest.event_id).await? {
        Some(event) if event.venue_id == identity.venue_id => event,
        _ => return Err(not_found()),
    };
    rules::require_check_in_open(&event)?;

    if let Some(existing) = state.tickets.find_by_guest(guest.id).await? {
        if existing.is_valid {
            return Ok(Json(existing));
        }
    }

    let ticket_id = Uuid::new_v4();
    let (qr_code, hmac_signature) = state
        .signer
        .sign(ticket_id, event.id, guest.id)
        .map_err(|e| PlatformError::internal(e.to_string()))?;

    let now = Utc::now();
    let ticket = Ticket {
        id: ticket_id,
        event_id: event.id,
        guest_id: guest.id,
        qr_code,
        hmac_signature,
        is_valid: true,
        validated_at: None,
        created_at: now,
        updated_at: now,
    };
    state.tickets.insert(&ticket).await?;

    info!(ticket_id = %ticket.id, guest_id = %guest.id, "Issued ticket");
    Ok(Json(ticket))
}

/// Validate a scanned ticket
///
/// Always returns 200 with a structured result; an invalid ticket is a
/// routine outcome, not an error.
#[utoipa::path(
    post,
    path = "/validate",
    tag = "tickets",
    request_body = ValidateTicketRequest,
    responses(
        (status = 200, description = "Validation outcome", body = ValidateTicketResponse),
        (status = 403, description = "Insufficient role"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn validate_ticket(
    State(state): State<TicketsState>,
    auth: Authenticated,
    Json(req): Json<ValidateTicketRequest>,
) -> Result<Json<ValidateTicketResponse>, PlatformError> {
    let identity = auth.0;
    require_role(&identity, &[UserRole::Owner, UserRole::Admin, UserRole::Staff])?;

    let outcome = state
        .validation
        .validate(&req.qr_code, &req.signature, identity.venue_id)
        .await?;

    Ok(Json(ValidateTicketResponse {
        is_valid: outcome.is_valid,
        already_validated: outcome.already_validated,
        reason: outcome.reason,
        ticket: outcome.ticket,
        guest: outcome.guest,
        event: outcome.event,
    }))
}

/// Revoke a ticket
#[utoipa::path(
    post,
    path = "/{id}/revoke",
    tag = "tickets",
    params(("id" = Uuid, Path, description = "Ticket id")),
    responses(
        (status = 200, description = "Ticket revoked", body = SuccessResponse),
        (status = 403, description = "Insufficient role"),
        (status = 404, description = "Ticket not found")
    )
)]
pub async fn revoke_ticket(
    State(state): State<TicketsState>,
    auth: Authenticated,
    Path(id): Path<Uuid>,
) -> Result<Json<SuccessResponse>, PlatformError> {
    let identity = auth.0;
    require_role(&identity, &[UserRole::Owner, UserRole::Admin])?;

    let ticket = state.find_scoped(id, &identity).await?;
    let revoked = state.tickets.invalidate(ticket.id).await?;
    if revoked {
        info!(ticket_id = %ticket.id, user_id = %identity.user_id, "Ticket revoked");
    }

    Ok(Json(if revoked {
        SuccessResponse::ok()
    } else {
        SuccessResponse::with_message("Ticket was already revoked")
    }))
}

/// Create the tickets router
pub fn tickets_router(state: TicketsState) -> Router {
    Router::new()
        .route("/generate", post(generate_ticket))
        .route("/validate", post(validate_ticket))
        .route("/:id", get(get_ticket))
        .route("/:id/revoke", post(revoke_ticket))
        .with_state(state)
}
