//! Event API Endpoints
//!
//! - POST / - Create an event
//! - GET / - List events (paginated, optional status filter)
//! - GET /:id - Fetch an event
//! - PUT /:id - Edit event details
//! - DELETE /:id - Delete an upcoming event
//! - GET /:id/guests - Guest list for an event
//! - POST /:id/status - Move an event through its lifecycle

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use gl_common::{Event, EventStatus, Guest, UserRole};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::api::middleware::Authenticated;
use crate::api::tickets::require_role;
use crate::error::PlatformError;
use crate::repository::{EventRepository, GuestRepository};
use crate::service::rules;

/// Event creation request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub capacity: Option<i32>,
}

/// Event update request. Full replacement of the editable fields.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub capacity: Option<i32>,
}

/// Status change request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventStatusRequest {
    pub status: EventStatus,
}

/// Event list query parameters
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListEventsQuery {
    /// Filter to a single status
    pub status: Option<EventStatus>,

    /// 1-based page number, default 1
    pub page: Option<u32>,

    /// Page size, default 20, capped at 100
    pub per_page: Option<u32>,
}

/// Paginated event list
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventListResponse {
    pub events: Vec<Event>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

/// Guest list for an event, with check-in progress
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GuestListResponse {
    pub event_id: Uuid,
    pub guests: Vec<Guest>,
    pub total_count: usize,
    pub checked_in_count: usize,
}

/// Events service state
#[derive(Clone)]
pub struct EventsState {
    pub events: Arc<dyn EventRepository>,
    pub guests: Arc<dyn GuestRepository>,
}

impl EventsState {
    async fn find_scoped(&self, id: Uuid, venue_id: Uuid) -> Result<Event, PlatformError> {
        match self.events.find_by_id(id).await? {
            Some(event) if event.venue_id == venue_id => Ok(event),
            _ => Err(PlatformError::not_found("Event", id.to_string())),
        }
    }
}

/// Create an event
#[utoipa::path(
    post,
    path = "/",
    tag = "events",
    request_body = CreateEventRequest,
    responses(
        (status = 201, description = "Event created", body = Event),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Insufficient role")
    )
)]
pub async fn create_event(
    State(state): State<EventsState>,
    auth: Authenticated,
    Json(req): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<Event>), PlatformError> {
    let identity = auth.0;
    require_role(&identity, &[UserRole::Owner, UserRole::Admin, UserRole::Staff])?;

    if req.name.trim().is_empty() {
        return Err(PlatformError::validation("Event name must not be empty"));
    }
    rules::validate_event_dates(req.start_time, req.end_time)?;
    if matches!(req.capacity, Some(c) if c <= 0) {
        return Err(PlatformError::validation("Capacity must be positive"));
    }

    let now = Utc::now();
    let event = Event {
        id: Uuid::new_v4(),
        venue_id: identity.venue_id,
        name: req.name.trim().to_string(),
        description: req.description,
        start_time: req.start_time,
        end_time: req.end_time,
        location: req.location,
        capacity: req.capacity,
        status: EventStatus::Upcoming,
        created_at: now,
        updated_at: now,
    };
    state.events.insert(&event).await?;

    info!(event_id = %event.id, venue_id = %event.venue_id, "Created event");
    Ok((StatusCode::CREATED, Json(event)))
}

/// List the venue's events
///
/// Newest start time first, optionally filtered by status.
#[utoipa::path(
    get,
    path = "/",
    tag = "events",
    params(ListEventsQuery),
    responses(
        (status = 200, description = "Paginated events", body = EventListResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_events(
    State(state): State<EventsState>,
    auth: Authenticated,
    Query(query): Query<ListEventsQuery>,
) -> Result<Json<EventListResponse>, PlatformError> {
    let venue_id = auth.0.venue_id;
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let offset = i64::from(page - 1) * i64::from(per_page);

    let total = state.events.count_by_venue(venue_id, query.status).await?;
    let events = state
        .events
        .list_by_venue(venue_id, query.status, i64::from(per_page), offset)
        .await?;

    Ok(Json(EventListResponse {
        events,
        page,
        per_page,
        total,
    }))
}

/// Fetch an event by id
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "events",
    params(("id" = Uuid, Path, description = "Event id")),
    responses(
        (status = 200, description = "The event", body = Event),
        (status = 404, description = "Event not found")
    )
)]
pub async fn get_event(
    State(state): State<EventsState>,
    auth: Authenticated,
    Path(id): Path<Uuid>,
) -> Result<Json<Event>, PlatformError> {
    let event = state.find_scoped(id, auth.0.venue_id).await?;
    Ok(Json(event))
}

/// Edit an event's details
///
/// Terminal events (ended or cancelled) are immutable.
#[utoipa::path(
    put,
    path = "/{id}",
    tag = "events",
    params(("id" = Uuid, Path, description = "Event id")),
    request_body = UpdateEventRequest,
    responses(
        (status = 200, description = "Updated event", body = Event),
        (status = 400, description = "Invalid input or event no longer modifiable"),
        (status = 403, description = "Insufficient role"),
        (status = 404, description = "Event not found")
    )
)]
pub async fn update_event(
    State(state): State<EventsState>,
    auth: Authenticated,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateEventRequest>,
) -> Result<Json<Event>, PlatformError> {
    let identity = auth.0;
    require_role(&identity, &[UserRole::Owner, UserRole::Admin, UserRole::Staff])?;

    let mut event = state.find_scoped(id, identity.venue_id).await?;
    rules::require_modifiable(&event)?;

    if req.name.trim().is_empty() {
        return Err(PlatformError::validation("Event name must not be empty"));
    }
    rules::validate_event_dates(req.start_time, req.end_time)?;
    if matches!(req.capacity, Some(c) if c <= 0) {
        return Err(PlatformError::validation("Capacity must be positive"));
    }

    event.name = req.name.trim().to_string();
    event.description = req.description;
    event.start_time = req.start_time;
    event.end_time = req.end_time;
    event.location = req.location;
    event.capacity = req.capacity;
    event.updated_at = Utc::now();
    state.events.update(&event).await?;

    info!(event_id = %event.id, "Updated event");
    Ok(Json(event))
}

/// Delete an event
///
/// Only upcoming events can be deleted; guests and tickets go with it.
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "events",
    params(("id" = Uuid, Path, description = "Event id")),
    responses(
        (status = 204, description = "Event deleted"),
        (status = 400, description = "Event is no longer upcoming"),
        (status = 403, description = "Insufficient role"),
        (status = 404, description = "Event not found")
    )
)]
pub async fn delete_event(
    State(state): State<EventsState>,
    auth: Authenticated,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, PlatformError> {
    let identity = auth.0;
    require_role(&identity, &[UserRole::Owner, UserRole::Admin])?;

    let event = state.find_scoped(id, identity.venue_id).await?;
    if event.status != EventStatus::Upcoming {
        return Err(PlatformError::validation(
            "Only upcoming events can be deleted",
        ));
    }

    state.events.delete(event.id).await?;
    info!(event_id = %event.id, user_id = %identity.user_id, "Deleted event");
    Ok(StatusCode::NO_CONTENT)
}

/// Guest list for an event
#[utoipa::path(
    get,
    path = "/{id}/guests",
    tag = "events",
    params(("id" = Uuid, Path, description = "Event id")),
    responses(
        (status = 200, description = "The event's guests", body = GuestListResponse),
        (status = 404, description = "Event not found")
    )
)]
pub async fn list_event_guests(
    State(state): State<EventsState>,
    auth: Authenticated,
    Path(id): Path<Uuid>,
) -> Result<Json<GuestListResponse>, PlatformError> {
    let event = state.find_scoped(id, auth.0.venue_id).await?;
    let guests = state.guests.list_by_event(event.id).await?;
    let checked_in_count = guests.iter().filter(|g| g.is_checked_in).count();

    Ok(Json(GuestListResponse {
        event_id: event.id,
        total_count: guests.len(),
        checked_in_count,
        guests,
    }))
}

/// Change an event's status
///
/// Transitions follow the lifecycle table; a request for the current status
/// is a no-op success.
#[utoipa::path(
    post,
    path = "/{id}/status",
    tag = "events",
    params(("id" = Uuid, Path, description = "Event id")),
    request_body = UpdateEventStatusRequest,
    responses(
        (status = 200, description = "Updated event", body = Event),
        (status = 400, description = "Transition not allowed"),
        (status = 403, description = "Insufficient role"),
        (status = 404, description = "Event not found")
    )
)]
pub async fn update_event_status(
    State(state): State<EventsState>,
    auth: Authenticated,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateEventStatusRequest>,
) -> Result<Json<Event>, PlatformError> {
    let identity = auth.0;
    require_role(&identity, &[UserRole::Owner, UserRole::Admin])?;

    let mut event = state.find_scoped(id, identity.venue_id).await?;
    rules::validate_status_transition(event.status, req.status)?;

    if event.status != req.status {
        state.events.update_status(event.id, req.status).await?;
        info!(event_id = %event.id, from = %event.status, to = %req.status, "Event status changed");
        event.status = req.status;
        event.updated_at = Utc::now();
    }

    Ok(Json(event))
}

/// Create the events router
pub fn events_router(state: EventsState) -> Router {
    Router::new()
        .route("/", post(create_event).get(list_events))
        .route("/:id", get(get_event).put(update_event).delete(delete_event))
        .route("/:id/guests", get(list_event_guests))
        .route("/:id/status", post(update_event_status))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_deserialization() {
        let json = r#"{
            "name": "Opening Night",
            "startTime": "2026-09-01T19:00:00Z",
            "endTime": "2026-09-02T01:00:00Z",
            "capacity": 300
        }"#;
        let req: CreateEventRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.name, "Opening Night");
        assert_eq!(req.capacity, Some(300));
        assert!(req.location.is_none());
    }

    #[test]
    fn test_update_request_omitted_fields_clear() {
        let json = r#"{
            "name": "Opening Night (moved)",
            "startTime": "2026-09-08T19:00:00Z",
            "endTime": "2026-09-09T01:00:00Z"
        }"#;
        let req: UpdateEventRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.name, "Opening Night (moved)");
        assert!(req.capacity.is_none());
        assert!(req.description.is_none());
    }

    #[test]
    fn test_list_query_fields_are_optional() {
        let q: ListEventsQuery = serde_json::from_str("{}").unwrap();
        assert!(q.status.is_none());
        assert!(q.page.is_none());

        let q: ListEventsQuery =
            serde_json::from_str(r#"{"status":"upcoming","page":2,"per_page":50}"#).unwrap();
        assert_eq!(q.status, Some(EventStatus::Upcoming));
        assert_eq!(q.page, Some(2));
        assert_eq!(q.per_page, Some(50));
    }

    #[test]
    fn test_guest_list_response_wire_shape() {
        let response = GuestListResponse {
            event_id: Uuid::new_v4(),
            guests: vec![],
            total_count: 0,
            checked_in_count: 0,
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("eventId"));
        assert!(json.contains("checkedInCount"));
    }

    #[test]
    fn test_status_request_uses_lowercase_wire_names() {
        let req: UpdateEventStatusRequest = serde_json::from_str(r#"{"status":"live"}"#).unwrap();
        assert_eq!(req.status, EventStatus::Live);
    }
}
