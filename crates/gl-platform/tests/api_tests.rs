//! Platform Integration Tests
//!
//! End-to-end flows over the in-memory backends: credential handling,
//! token lifecycle through the auth gate, ticket issue-then-scan, and
//! event listing.

use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use gl_auth::{
    generate_refresh_token, AccessClaims, AuthConfig, AuthGate, AuthRejection,
    InMemoryRevocationStore, RevocationStore, TicketSigner, TokenCodec,
};
use gl_common::{Event, EventStatus, Guest, Ticket, TicketType, UserRole};
use gl_platform::repository::{
    EventRepository, GuestRepository, InMemoryEventRepository, InMemoryGuestRepository,
    InMemoryTicketRepository, TicketRepository,
};
use gl_platform::service::{PasswordService, TicketValidationService};

const SECRET: &str = "integration-test-secret";

mod token_lifecycle_tests {
    use super::*;

    #[tokio::test]
    async fn test_login_logout_lifecycle() {
        let config = AuthConfig::new(SECRET);
        let codec = TokenCodec::new(SECRET);
        let store = Arc::new(InMemoryRevocationStore::new());
        let gate = AuthGate::new(TokenCodec::new(SECRET), store.clone());

        // "Login": mint an access token and store a refresh token
        let user_id = Uuid::new_v4();
        let claims = AccessClaims::new(
            user_id,
            UserRole::Staff,
            Uuid::new_v4(),
            config.access_token_ttl(),
        );
        let access_token = codec.mint(&claims).unwrap();
        let refresh_token = generate_refresh_token();
        store
            .put_refresh_token(&refresh_token, user_id, config.refresh_token_ttl_seconds())
            .await
            .unwrap();

        // The token authenticates
        let header = format!("Bearer {}", access_token);
        let identity = gate.authenticate(Some(&header)).await.unwrap();
        assert_eq!(identity.user_id, user_id);
        assert_eq!(identity.role, UserRole::Staff);

        // "Logout": blacklist for the remaining lifetime, drop the refresh
        store
            .blacklist(&identity.token_id, identity.remaining_ttl_seconds())
            .await
            .unwrap();
        store.delete_refresh_token(&refresh_token).await.unwrap();

        // The same token is now rejected despite its valid signature
        assert!(matches!(
            gate.authenticate(Some(&header)).await,
            Err(AuthRejection::Revoked)
        ));
        // And the refresh token is gone
        assert_eq!(
            store.subject_for_refresh_token(&refresh_token).await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_refresh_rotation_consumes_old_token() {
        let store = InMemoryRevocationStore::new();
        let user_id = Uuid::new_v4();

        let old = generate_refresh_token();
        store.put_refresh_token(&old, user_id, 3600).await.unwrap();

        // Rotation: claim the old token, then store a new one
        let subject = store.claim_refresh_token(&old).await.unwrap();
        assert_eq!(subject, Some(user_id));
        let new = generate_refresh_token();
        store.put_refresh_token(&new, user_id, 3600).await.unwrap();

        // A replay of the old token finds nothing and must not mint tokens
        assert_eq!(store.claim_refresh_token(&old).await.unwrap(), None);
        // The new token still works
        assert_eq!(
            store.subject_for_refresh_token(&new).await.unwrap(),
            Some(user_id)
        );
    }

    #[tokio::test]
    async fn test_unknown_refresh_token_is_rejected() {
        let store = InMemoryRevocationStore::new();
        assert_eq!(
            store
                .claim_refresh_token("never-issued-token")
                .await
                .unwrap(),
            None
        );
    }
}

mod credential_tests {
    use super::*;

    #[test]
    fn test_password_round_trip() {
        let service = PasswordService::new();
        let hash = service.hash_password("Venue-0wner-Passw0rd!").unwrap();

        assert!(service.verify_password("Venue-0wner-Passw0rd!", &hash));
        assert!(!service.verify_password("Venue-0wner-Passw0rd?", &hash));
        // The hash is a PHC string, never the plaintext
        assert!(hash.starts_with("$argon2"));
    }
}

mod check_in_flow_tests {
    use super::*;

    struct World {
        validation: TicketValidationService,
        tickets: Arc<InMemoryTicketRepository>,
        guests: Arc<InMemoryGuestRepository>,
        events: Arc<InMemoryEventRepository>,
        signer: TicketSigner,
        venue_id: Uuid,
    }

    async fn world() -> World {
        let tickets = Arc::new(InMemoryTicketRepository::new());
        let guests = Arc::new(InMemoryGuestRepository::new());
        let events = Arc::new(InMemoryEventRepository::new());
        let signer = TicketSigner::new(SECRET);
        let validation = TicketValidationService::new(
            signer.clone(),
            tickets.clone(),
            guests.clone(),
            events.clone(),
        );
        World {
            validation,
            tickets,
            guests,
            events,
            signer,
            venue_id: Uuid::new_v4(),
        }
    }

    async fn issue_ticket(w: &World) -> Ticket {
        let now = Utc::now();
        let event = Event {
            id: Uuid::new_v4(),
            venue_id: w.venue_id,
            name: "Friday Live".to_string(),
            description: None,
            start_time: now,
            end_time: now + Duration::hours(6),
            location: Some("Main Hall".to_string()),
            capacity: Some(250),
            status: EventStatus::Live,
            created_at: now,
            updated_at: now,
        };
        let guest = Guest {
            id: Uuid::new_v4(),
            event_id: event.id,
            first_name: "Margaret".to_string(),
            last_name: "Hamilton".to_string(),
            email: Some("margaret@example.com".to_string()),
            phone_number: None,
            ticket_type: TicketType::Vip,
            is_checked_in: false,
            checked_in_at: None,
            notes: None,
            created_at: now,
            updated_at: now,
        };
        let ticket_id = Uuid::new_v4();
        let (qr_code, hmac_signature) = w.signer.sign(ticket_id, event.id, guest.id).unwrap();
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

        w.events.insert(&event).await.unwrap();
        w.guests.insert(&guest).await.unwrap();
        w.tickets.insert(&ticket).await.unwrap();
        ticket
    }

    #[tokio::test]
    async fn test_issue_then_scan() {
        let w = world().await;
        let ticket = issue_ticket(&w).await;

        let result = w
            .validation
            .validate(&ticket.qr_code, &ticket.hmac_signature, w.venue_id)
            .await
            .unwrap();

        assert!(result.is_valid);
        assert!(!result.already_validated);
        assert_eq!(result.guest.as_ref().unwrap().full_name(), "Margaret Hamilton");

        // The guest is checked in and the ticket stamped
        let guest = w.guests.find_by_id(ticket.guest_id).await.unwrap().unwrap();
        assert!(guest.is_checked_in);
        let stored = w.tickets.find_by_id(ticket.id).await.unwrap().unwrap();
        assert!(stored.validated_at.is_some());
    }

    #[tokio::test]
    async fn test_double_scan_reports_already_validated() {
        let w = world().await;
        let ticket = issue_ticket(&w).await;

        let first = w
            .validation
            .validate(&ticket.qr_code, &ticket.hmac_signature, w.venue_id)
            .await
            .unwrap();
        let second = w
            .validation
            .validate(&ticket.qr_code, &ticket.hmac_signature, w.venue_id)
            .await
            .unwrap();

        assert!(first.is_valid && !first.already_validated);
        assert!(second.is_valid && second.already_validated);
        assert_eq!(
            first.ticket.unwrap().validated_at,
            second.ticket.unwrap().validated_at
        );
    }

    #[tokio::test]
    async fn test_rescan_after_event_ends_reports_already_validated() {
        let w = world().await;
        let ticket = issue_ticket(&w).await;

        let first = w
            .validation
            .validate(&ticket.qr_code, &ticket.hmac_signature, w.venue_id)
            .await
            .unwrap();
        assert!(first.is_valid && !first.already_validated);

        w.events
            .update_status(ticket.event_id, EventStatus::Ended)
            .await
            .unwrap();

        // A stamped ticket stays an idempotent success after the event ends
        let second = w
            .validation
            .validate(&ticket.qr_code, &ticket.hmac_signature, w.venue_id)
            .await
            .unwrap();
        assert!(second.is_valid && second.already_validated);
        assert_eq!(
            first.ticket.unwrap().validated_at,
            second.ticket.unwrap().validated_at
        );
    }

    #[tokio::test]
    async fn test_concurrent_first_scans_validate_exactly_once() {
        let w = world().await;
        let ticket = issue_ticket(&w).await;

        // Both scans race on the conditional write; exactly one wins
        let a = w.tickets.mark_validated_if_unset(ticket.id, Utc::now()).await.unwrap();
        let b = w.tickets.mark_validated_if_unset(ticket.id, Utc::now()).await.unwrap();
        assert!(a ^ b);
    }

    #[tokio::test]
    async fn test_revoked_ticket_cannot_check_in() {
        let w = world().await;
        let ticket = issue_ticket(&w).await;
        assert!(w.tickets.invalidate(ticket.id).await.unwrap());

        let result = w
            .validation
            .validate(&ticket.qr_code, &ticket.hmac_signature, w.venue_id)
            .await
            .unwrap();
        assert!(!result.is_valid);
        assert_eq!(result.reason.as_deref(), Some("Ticket has been revoked"));
    }

    #[tokio::test]
    async fn test_scan_from_another_venue_rejected() {
        let w = world().await;
        let ticket = issue_ticket(&w).await;

        let result = w
            .validation
            .validate(&ticket.qr_code, &ticket.hmac_signature, Uuid::new_v4())
            .await
            .unwrap();
        assert!(!result.is_valid);
        assert_eq!(
            result.reason.as_deref(),
            Some("Ticket is not valid for this venue")
        );
    }
}

mod event_listing_tests {
    use super::*;

    fn event(venue_id: Uuid, status: EventStatus, start_offset_hours: i64) -> Event {
        let now = Utc::now();
        Event {
            id: Uuid::new_v4(),
            venue_id,
            name: format!("Night {}", start_offset_hours),
            description: None,
            start_time: now + Duration::hours(start_offset_hours),
            end_time: now + Duration::hours(start_offset_hours + 4),
            location: None,
            capacity: None,
            status,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_list_is_venue_scoped_and_newest_first() {
        let events = InMemoryEventRepository::new();
        let venue_id = Uuid::new_v4();

        let early = event(venue_id, EventStatus::Upcoming, 24);
        let late = event(venue_id, EventStatus::Upcoming, 72);
        let foreign = event(Uuid::new_v4(), EventStatus::Upcoming, 48);
        events.insert(&early).await.unwrap();
        events.insert(&late).await.unwrap();
        events.insert(&foreign).await.unwrap();

        let listed = events.list_by_venue(venue_id, None, 20, 0).await.unwrap();
        assert_eq!(
            listed.iter().map(|e| e.id).collect::<Vec<_>>(),
            vec![late.id, early.id]
        );
        assert_eq!(events.count_by_venue(venue_id, None).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_list_filters_by_status_and_paginates() {
        let events = InMemoryEventRepository::new();
        let venue_id = Uuid::new_v4();

        for i in 0..3 {
            events
                .insert(&event(venue_id, EventStatus::Upcoming, i * 24))
                .await
                .unwrap();
        }
        events
            .insert(&event(venue_id, EventStatus::Ended, -24))
            .await
            .unwrap();

        let upcoming = events
            .list_by_venue(venue_id, Some(EventStatus::Upcoming), 20, 0)
            .await
            .unwrap();
        assert_eq!(upcoming.len(), 3);
        assert_eq!(
            events
                .count_by_venue(venue_id, Some(EventStatus::Ended))
                .await
                .unwrap(),
            1
        );

        let page_two = events
            .list_by_venue(venue_id, Some(EventStatus::Upcoming), 2, 2)
            .await
            .unwrap();
        assert_eq!(page_two.len(), 1);
    }

    #[tokio::test]
    async fn test_deleted_event_is_gone() {
        let events = InMemoryEventRepository::new();
        let e = event(Uuid::new_v4(), EventStatus::Upcoming, 24);
        events.insert(&e).await.unwrap();

        assert!(events.delete(e.id).await.unwrap());
        assert!(!events.delete(e.id).await.unwrap());
        assert!(events.find_by_id(e.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_guest_list_is_oldest_first() {
        let guests = InMemoryGuestRepository::new();
        let event_id = Uuid::new_v4();
        let base = Utc::now();

        for i in 0..3 {
            let guest = Guest {
                id: Uuid::new_v4(),
                event_id,
                first_name: format!("Guest{}", i),
                last_name: "Example".to_string(),
                email: None,
                phone_number: None,
                ticket_type: TicketType::General,
                is_checked_in: i == 0,
                checked_in_at: None,
                notes: None,
                created_at: base + Duration::seconds(i),
                updated_at: base + Duration::seconds(i),
            };
            guests.insert(&guest).await.unwrap();
        }

        let listed = guests.list_by_event(event_id).await.unwrap();
        assert_eq!(listed.len(), 3);
        assert_eq!(listed[0].first_name, "Guest0");
        assert_eq!(listed[2].first_name, "Guest2");
        assert_eq!(listed.iter().filter(|g| g.is_checked_in).count(), 1);
    }
}
