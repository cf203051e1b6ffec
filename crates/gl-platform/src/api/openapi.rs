//! OpenAPI Documentation
//!
//! Central OpenAPI document for the platform APIs.

use utoipa::OpenApi;

/// GuestList API OpenAPI Documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "GuestList API",
        version = "1.0.0",
        description = "REST APIs for venue guest management and ticket check-in"
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "auth", description = "Authentication"),
        (name = "venues", description = "Venue management"),
        (name = "events", description = "Event management"),
        (name = "guests", description = "Guest list management"),
        (name = "tickets", description = "Ticket issuance and check-in")
    ),
    paths(
        // Auth API
        super::auth::register,
        super::auth::login,
        super::auth::refresh,
        super::auth::logout,
        super::auth::get_current_user,
        // Venues API
        super::venues::get_venue,
        super::venues::update_venue,
        super::venues::get_venue_events,
        // Events API
        super::events::create_event,
        super::events::list_events,
        super::events::get_event,
        super::events::update_event,
        super::events::delete_event,
        super::events::list_event_guests,
        super::events::update_event_status,
        // Guests API
        super::guests::create_guest,
        super::guests::get_guest,
        super::guests::check_in_guest,
        // Tickets API
        super::tickets::get_ticket,
        super::tickets::generate_ticket,
        super::tickets::validate_ticket,
        super::tickets::revoke_ticket,
    ),
    components(
        schemas(
            // Auth schemas
            super::auth::RegisterRequest,
            super::auth::LoginRequest,
            super::auth::RefreshRequest,
            super::auth::LogoutRequest,
            super::auth::TokenResponse,
            super::auth::CurrentUserResponse,
            // Venue schemas
            super::venues::UpdateVenueRequest,
            // Event schemas
            super::events::CreateEventRequest,
            super::events::UpdateEventRequest,
            super::events::UpdateEventStatusRequest,
            super::events::EventListResponse,
            super::events::GuestListResponse,
            // Guest schemas
            super::guests::CreateGuestRequest,
            super::guests::CheckInResponse,
            // Ticket schemas
            super::tickets::GenerateTicketRequest,
            super::tickets::ValidateTicketRequest,
            super::tickets::ValidateTicketResponse,
            // Common schemas
            super::common::ApiError,
            super::common::SuccessResponse,
        )
    )
)]
pub struct ApiDoc;
