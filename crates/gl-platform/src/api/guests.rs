//! Guest API Endpoints
//!
//! - POST / - Add a guest to an event's list
//! - GET /:id - Fetch a guest
//! - PUT /:id/check-in - Check a guest in at the door

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;
use gl_common::{Guest, TicketType, UserRole};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::middleware::Authenticated;
use crate::api::tickets::require_role;
use crate::error::PlatformError;
use crate::repository::{EventRepository, GuestRepository};
use crate::service::rules;

/// Guest creation request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateGuestRequest {
    pub event_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    pub ticket_type: TicketType,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Manual check-in result
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckInResponse {
    pub guest: Guest,
    pub already_checked_in: bool,
}

/// Guests service state
#[derive(Clone)]
pub struct GuestsState {
    pub guests: Arc<dyn GuestRepository>,
    pub events: Arc<dyn EventRepository>,
}

/// Add a guest to an event
///
/// The event must belong to the caller's venue, still be open for check-in,
/// and have remaining capacity.
#[utoipa::path(
    post,
    path = "/",
    tag = "guests",
    request_body = CreateGuestRequest,
    responses(
        (status = 201, description = "Guest added", body = Guest),
        (status = 400, description = "Event closed or at capacity"),
        (status = 403, description = "Insufficient role"),
        (status = 404, description = "Event not found")
    )
)]
pub async fn create_guest(
    State(state): State<GuestsState>,
    auth: Authenticated,
    Json(req): Json<CreateGuestRequest>,
) -> Result<(StatusCode, Json<Guest>), PlatformError> {
    let identity = auth.0;
    require_role(&identity, &[UserRole::Owner, UserRole::Admin, UserRole::Staff])?;

    if req.first_name.trim().is_empty() || req.last_name.trim().is_empty() {
        return Err(PlatformError::validation("Guest name must not be empty"));
    }

    let event = match state.events.find_by_id(req.event_id).await? {
        Some(event) if event.venue_id == identity.venue_id => event,
        _ => return Err(PlatformError::not_found("Event", req.event_id.to_string())),
    };
    rules::require_check_in_open(&event)?;

    let current = state.guests.count_by_event(event.id).await?;
    rules::validate_capacity(&event, current)?;

    let now = Utc::now();
    let guest = Guest {
        id: Uuid::new_v4(),
        event_id: event.id,
        first_name: req.first_name.trim().to_string(),
        last_name: req.last_name.trim().to_string(),
        email: req.email,
        phone_number: req.phone_number,
        ticket_type: req.ticket_type,
        is_checked_in: false,
        checked_in_at: None,
        notes: req.notes,
        created_at: now,
        updated_at: now,
    };
    state.guests.insert(&guest).await?;

    info!(guest_id = %guest.id, event_id = %event.id, "Added guest");
    Ok((StatusCode::CREATED, Json(guest)))
}

/// Fetch a guest by id
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "guests",
    params(("id" = Uuid, Path, description = "Guest id")),
    responses(
        (status = 200, description = "The guest", body = Guest),
        (status = 404, description = "Guest not found")
    )
)]
pub async fn get_guest(
    State(state): State<GuestsState>,
    auth: Authenticated,
    Path(id): Path<Uuid>,
) -> Result<Json<Guest>, PlatformError> {
    let not_found = || PlatformError::not_found("Guest", id.to_string());

    let guest = state.guests.find_by_id(id).await?.ok_or_else(not_found)?;
    match state.events.find_by_id(guest.event_id).await? {
        Some(event) if event.venue_id == auth.0.venue_id => Ok(Json(guest)),
        _ => Err(not_found()),
    }
}

/// Check a guest in manually
///
/// For walk-ups without a ticket. Idempotent: a repeat call reports
/// `alreadyCheckedIn` and never rewrites the original timestamp.
#[utoipa::path(
    put,
    path = "/{id}/check-in",
    tag = "guests",
    params(("id" = Uuid, Path, description = "Guest id")),
    responses(
        (status = 200, description = "Check-in result", body = CheckInResponse),
        (status = 400, description = "Event closed for check-in"),
        (status = 403, description = "Insufficient role"),
        (status = 404, description = "Guest not found")
    )
)]
pub async fn check_in_guest(
    State(state): State<GuestsState>,
    auth: Authenticated,
    Path(id): Path<Uuid>,
) -> Result<Json<CheckInResponse>, PlatformError> {
    let identity = auth.0;
    require_role(&identity, &[UserRole::Owner, UserRole::Admin, UserRole::Staff])?;

    let not_found = || PlatformError::not_found("Guest", id.to_string());
    let mut guest = state.guests.find_by_id(id).await?.ok_or_else(not_found)?;
    let event = match state.events.find_by_id(guest.event_id).await? {
        Some(event) if event.venue_id == identity.venue_id => event,
        _ => return Err(not_found()),
    };
    rules::require_check_in_open(&event)?;

    let already_checked_in = guest.is_checked_in;
    if !already_checked_in {
        let now = Utc::now();
        state.guests.mark_checked_in(guest.id, now).await?;
        guest.is_checked_in = true;
        guest.checked_in_at = Some(now);
        guest.updated_at = now;
        info!(guest_id = %guest.id, event_id = %event.id, "Checked in guest");
    }

    Ok(Json(CheckInResponse {
        guest,
        already_checked_in,
    }))
}

/// Create the guests router
pub fn guests_router(state: GuestsState) -> Router {
    Router::new()
        .route("/", post(create_guest))
        .route("/:id", get(get_guest))
        .route("/:id/check-in", put(check_in_guest))
        .with_state(state)
}
