//! Venue API Endpoints
//!
//! - GET /:id - Fetch venue details
//! - PUT /:id - Update venue details
//! - GET /:id/events - All events for a venue
//!
//! Callers can only reach their own venue; any other id reports not-found.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use gl_common::{Event, UserRole, Venue};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::middleware::Authenticated;
use crate::api::tickets::require_role;
use crate::error::PlatformError;
use crate::repository::{EventRepository, VenueRepository};

/// Venue update request. Only the supplied fields change.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVenueRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// Venues service state
#[derive(Clone)]
pub struct VenuesState {
    pub venues: Arc<dyn VenueRepository>,
    pub events: Arc<dyn EventRepository>,
}

impl VenuesState {
    async fn find_own(&self, id: Uuid, venue_id: Uuid) -> Result<Venue, PlatformError> {
        let not_found = || PlatformError::not_found("Venue", id.to_string());
        if id != venue_id {
            return Err(not_found());
        }
        self.venues.find_by_id(id).await?.ok_or_else(not_found)
    }
}

/// Fetch venue details
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "venues",
    params(("id" = Uuid, Path, description = "Venue id")),
    responses(
        (status = 200, description = "The venue", body = Venue),
        (status = 404, description = "Venue not found")
    )
)]
pub async fn get_venue(
    State(state): State<VenuesState>,
    auth: Authenticated,
    Path(id): Path<Uuid>,
) -> Result<Json<Venue>, PlatformError> {
    let venue = state.find_own(id, auth.0.venue_id).await?;
    Ok(Json(venue))
}

/// Update venue details
#[utoipa::path(
    put,
    path = "/{id}",
    tag = "venues",
    params(("id" = Uuid, Path, description = "Venue id")),
    request_body = UpdateVenueRequest,
    responses(
        (status = 200, description = "Updated venue", body = Venue),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Insufficient role"),
        (status = 404, description = "Venue not found")
    )
)]
pub async fn update_venue(
    State(state): State<VenuesState>,
    auth: Authenticated,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateVenueRequest>,
) -> Result<Json<Venue>, PlatformError> {
    let identity = auth.0;
    require_role(&identity, &[UserRole::Owner, UserRole::Admin])?;

    let mut venue = state.find_own(id, identity.venue_id).await?;

    if let Some(name) = req.name {
        if name.trim().is_empty() {
            return Err(PlatformError::validation("Venue name must not be empty"));
        }
        venue.name = name.trim().to_string();
    }
    if let Some(email) = req.email {
        if !email.contains('@') {
            return Err(PlatformError::validation("Invalid email address"));
        }
        venue.email = email;
    }
    if let Some(address) = req.address {
        venue.address = Some(address);
    }
    if let Some(is_active) = req.is_active {
        venue.is_active = is_active;
    }
    venue.updated_at = Utc::now();
    state.venues.update(&venue).await?;

    info!(venue_id = %venue.id, user_id = %identity.user_id, "Updated venue");
    Ok(Json(venue))
}

/// All events for a venue
#[utoipa::path(
    get,
    path = "/{id}/events",
    tag = "venues",
    params(("id" = Uuid, Path, description = "Venue id")),
    responses(
        (status = 200, description = "The venue's events", body = [Event]),
        (status = 404, description = "Venue not found")
    )
)]
pub async fn get_venue_events(
    State(state): State<VenuesState>,
    auth: Authenticated,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Event>>, PlatformError> {
    let venue = state.find_own(id, auth.0.venue_id).await?;
    // Unpaged; the events router carries the paginated listing
    let events = state
        .events
        .list_by_venue(venue.id, None, i64::MAX, 0)
        .await?;
    Ok(Json(events))
}

/// Create the venues router
pub fn venues_router(state: VenuesState) -> Router {
    Router::new()
        .route("/:id", get(get_venue).put(update_venue))
        .route("/:id/events", get(get_venue_events))
        .with_state(state)
}
