//! In-memory repositories for tests and local development.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use uuid::Uuid;

use gl_common::{Event, EventStatus, Guest, Ticket, User, Venue};

use super::{EventRepository, GuestRepository, TicketRepository, UserRepository, VenueRepository};
use crate::error::Result;

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Mutex<HashMap<Uuid, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.users.lock().get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .lock()
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn insert(&self, user: &User) -> Result<()> {
        self.users.lock().insert(user.id, user.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryVenueRepository {
    venues: Mutex<HashMap<Uuid, Venue>>,
}

impl InMemoryVenueRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VenueRepository for InMemoryVenueRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Venue>> {
        Ok(self.venues.lock().get(&id).cloned())
    }

    async fn insert(&self, venue: &Venue) -> Result<()> {
        self.venues.lock().insert(venue.id, venue.clone());
        Ok(())
    }

    async fn update(&self, venue: &Venue) -> Result<()> {
        self.venues.lock().insert(venue.id, venue.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryEventRepository {
    events: Mutex<HashMap<Uuid, Event>>,
}

impl InMemoryEventRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventRepository for InMemoryEventRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Event>> {
        Ok(self.events.lock().get(&id).cloned())
    }

    async fn list_by_venue(
        &self,
        venue_id: Uuid,
        status: Option<EventStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Event>> {
        let mut events: Vec<Event> = self
            .events
            .lock()
            .values()
            .filter(|e| e.venue_id == venue_id && status.map_or(true, |s| e.status == s))
            .cloned()
            .collect();
        events.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        Ok(events
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn count_by_venue(&self, venue_id: Uuid, status: Option<EventStatus>) -> Result<i64> {
        Ok(self
            .events
            .lock()
            .values()
            .filter(|e| e.venue_id == venue_id && status.map_or(true, |s| e.status == s))
            .count() as i64)
    }

    async fn insert(&self, event: &Event) -> Result<()> {
        self.events.lock().insert(event.id, event.clone());
        Ok(())
    }

    async fn update(&self, event: &Event) -> Result<()> {
        self.events.lock().insert(event.id, event.clone());
        Ok(())
    }

    async fn update_status(&self, id: Uuid, status: EventStatus) -> Result<()> {
        if let Some(event) = self.events.lock().get_mut(&id) {
            event.status = status;
            event.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        Ok(self.events.lock().remove(&id).is_some())
    }
}

#[derive(Default)]
pub struct InMemoryGuestRepository {
    guests: Mutex<HashMap<Uuid, Guest>>,
}

impl InMemoryGuestRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GuestRepository for InMemoryGuestRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Guest>> {
        Ok(self.guests.lock().get(&id).cloned())
    }

    async fn insert(&self, guest: &Guest) -> Result<()> {
        self.guests.lock().insert(guest.id, guest.clone());
        Ok(())
    }

    async fn count_by_event(&self, event_id: Uuid) -> Result<i64> {
        Ok(self
            .guests
            .lock()
            .values()
            .filter(|g| g.event_id == event_id)
            .count() as i64)
    }

    async fn list_by_event(&self, event_id: Uuid) -> Result<Vec<Guest>> {
        let mut guests: Vec<Guest> = self
            .guests
            .lock()
            .values()
            .filter(|g| g.event_id == event_id)
            .cloned()
            .collect();
        guests.sort_by_key(|g| g.created_at);
        Ok(guests)
    }

    async fn mark_checked_in(&self, id: Uuid, at: DateTime<Utc>) -> Result<()> {
        if let Some(guest) = self.guests.lock().get_mut(&id) {
            guest.is_checked_in = true;
            guest.checked_in_at = Some(at);
            guest.updated_at = at;
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryTicketRepository {
    tickets: Mutex<HashMap<Uuid, Ticket>>,
}

impl InMemoryTicketRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TicketRepository for InMemoryTicketRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Ticket>> {
        Ok(self.tickets.lock().get(&id).cloned())
    }

    async fn find_by_guest(&self, guest_id: Uuid) -> Result<Option<Ticket>> {
        Ok(self
            .tickets
            .lock()
            .values()
            .filter(|t| t.guest_id == guest_id)
            .max_by_key(|t| t.created_at)
            .cloned())
    }

    async fn insert(&self, ticket: &Ticket) -> Result<()> {
        self.tickets.lock().insert(ticket.id, ticket.clone());
        Ok(())
    }

    async fn mark_validated_if_unset(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool> {
        let mut tickets = self.tickets.lock();
        match tickets.get_mut(&id) {
            Some(ticket) if ticket.validated_at.is_none() => {
                ticket.validated_at = Some(at);
                ticket.updated_at = at;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn invalidate(&self, id: Uuid) -> Result<bool> {
        let mut tickets = self.tickets.lock();
        match tickets.get_mut(&id) {
            Some(ticket) if ticket.is_valid => {
                ticket.is_valid = false;
                ticket.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
