//! Repository Layer
//!
//! Storage contracts for the platform's entities, with a Postgres backend for
//! production and an in-memory backend for tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gl_common::{Event, EventStatus, Guest, Ticket, User, Venue};
use uuid::Uuid;

use crate::error::Result;

mod memory;
mod postgres;

pub use memory::{
    InMemoryEventRepository, InMemoryGuestRepository, InMemoryTicketRepository,
    InMemoryUserRepository, InMemoryVenueRepository,
};
pub use postgres::{
    init_schema, PostgresEventRepository, PostgresGuestRepository, PostgresTicketRepository,
    PostgresUserRepository, PostgresVenueRepository,
};

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn insert(&self, user: &User) -> Result<()>;
}

#[async_trait]
pub trait VenueRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Venue>>;
    async fn insert(&self, venue: &Venue) -> Result<()>;
    async fn update(&self, venue: &Venue) -> Result<()>;
}

#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Event>>;

    /// Page through a venue's events, newest start time first, optionally
    /// filtered by status.
    async fn list_by_venue(
        &self,
        venue_id: Uuid,
        status: Option<EventStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Event>>;

    /// Total matching `list_by_venue`, for pagination metadata.
    async fn count_by_venue(&self, venue_id: Uuid, status: Option<EventStatus>) -> Result<i64>;

    async fn insert(&self, event: &Event) -> Result<()>;
    async fn update(&self, event: &Event) -> Result<()>;
    async fn update_status(&self, id: Uuid, status: EventStatus) -> Result<()>;

    /// Delete an event. Returns whether a row was removed.
    async fn delete(&self, id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait GuestRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Guest>>;
    async fn insert(&self, guest: &Guest) -> Result<()>;
    async fn count_by_event(&self, event_id: Uuid) -> Result<i64>;

    /// All guests for an event, oldest first.
    async fn list_by_event(&self, event_id: Uuid) -> Result<Vec<Guest>>;

    /// Record a check-in. Unconditional; idempotence is enforced one level
    /// up via the ticket's `validated_at`.
    async fn mark_checked_in(&self, id: Uuid, at: DateTime<Utc>) -> Result<()>;
}

#[async_trait]
pub trait TicketRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Ticket>>;
    async fn find_by_guest(&self, guest_id: Uuid) -> Result<Option<Ticket>>;
    async fn insert(&self, ticket: &Ticket) -> Result<()>;

    /// Set `validated_at` only if it is still unset. Returns whether this
    /// call performed the write, so exactly one of any set of concurrent
    /// scans observes a first validation.
    async fn mark_validated_if_unset(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool>;

    /// Administrative revocation.
    async fn invalidate(&self, id: Uuid) -> Result<bool>;
}
