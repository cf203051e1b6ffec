//! API Layer
//!
//! REST API endpoints for authentication, guest management and ticketing.

pub mod auth;
pub mod common;
pub mod events;
pub mod guests;
pub mod middleware;
pub mod openapi;
pub mod tickets;
pub mod venues;

pub use common::*;
pub use middleware::{AppState, Authenticated};

pub use auth::{auth_router, AuthApiState};
pub use events::{events_router, EventsState};
pub use guests::{guests_router, GuestsState};
pub use openapi::ApiDoc;
pub use tickets::{tickets_router, TicketsState};
pub use venues::{venues_router, VenuesState};
