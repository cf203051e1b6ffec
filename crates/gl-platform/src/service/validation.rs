//! Ticket check-in validation.
//!
//! Ordered short-circuit protocol. Scanning an invalid ticket is routine
//! traffic, so every negative outcome is a structured result with a reason,
//! not an error. Only infrastructure faults surface as `Err`.

use chrono::Utc;
use gl_auth::{parse_qr_code, TicketSigner};
use gl_common::{Event, Guest, Ticket};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::Result;
use crate::repository::{EventRepository, GuestRepository, TicketRepository};

/// Outcome of a scan. Includes whichever records were resolved, so a scanner
/// can show partial context even on failure.
#[derive(Debug, Default)]
pub struct TicketValidation {
    pub is_valid: bool,
    /// True when the ticket had already been validated before this scan.
    pub already_validated: bool,
    pub ticket: Option<Ticket>,
    pub guest: Option<Guest>,
    pub event: Option<Event>,
    pub reason: Option<String>,
}

impl TicketValidation {
    fn rejected(reason: &str) -> Self {
        Self {
            reason: Some(reason.to_string()),
            ..Default::default()
        }
    }
}

pub struct TicketValidationService {
    signer: TicketSigner,
    tickets: Arc<dyn TicketRepository>,
    guests: Arc<dyn GuestRepository>,
    events: Arc<dyn EventRepository>,
}

impl TicketValidationService {
    pub fn new(
        signer: TicketSigner,
        tickets: Arc<dyn TicketRepository>,
        guests: Arc<dyn GuestRepository>,
        events: Arc<dyn EventRepository>,
    ) -> Self {
        Self {
            signer,
            tickets,
            guests,
            events,
        }
    }

    /// Validate a scanned QR payload for a caller scoped to `venue_id`.
    pub async fn validate(
        &self,
        qr_code: &str,
        signature: &str,
        venue_id: Uuid,
    ) -> Result<TicketValidation> {
        // Offline checks first; a forged or malformed code never touches the
        // database.
        if !self.signer.verify_signature(qr_code, signature) {
            debug!("Rejected ticket with bad signature");
            return Ok(TicketValidation::rejected("Forged or corrupted ticket"));
        }

        let (ticket_id, event_id, guest_id) = match parse_qr_code(qr_code) {
            Ok(ids) => ids,
            Err(_) => {
                debug!("Rejected ticket with malformed payload");
                return Ok(TicketValidation::rejected("Forged or corrupted ticket"));
            }
        };

        let ticket = match self.tickets.find_by_id(ticket_id).await? {
            Some(ticket) => ticket,
            None => return Ok(TicketValidation::rejected("Ticket not found in system")),
        };

        if !ticket.is_valid {
            return Ok(TicketValidation {
                ticket: Some(ticket),
                ..TicketValidation::rejected("Ticket has been revoked")
            });
        }

        // Tenant isolation: a missing event and a foreign event report the
        // same reason so existence never leaks across venues.
        let event = match self.events.find_by_id(event_id).await? {
            Some(event) if event.venue_id == venue_id => event,
            _ => {
                return Ok(TicketValidation {
                    ticket: Some(ticket),
                    ..TicketValidation::rejected("Ticket is not valid for this venue")
                })
            }
        };

        let guest = match self.guests.find_by_id(guest_id).await? {
            Some(guest) => guest,
            None => {
                // Ticket and event context still returned for diagnostics
                return Ok(TicketValidation {
                    ticket: Some(ticket),
                    event: Some(event),
                    ..TicketValidation::rejected("Guest not found")
                });
            }
        };

        if ticket.validated_at.is_some() {
            return Ok(TicketValidation {
                is_valid: true,
                already_validated: true,
                ticket: Some(ticket),
                guest: Some(guest),
                event: Some(event),
                reason: None,
            });
        }

        let now = Utc::now();
        let first_write = self.tickets.mark_validated_if_unset(ticket_id, now).await?;
        if first_write {
            self.guests.mark_checked_in(guest_id, now).await?;
            info!(ticket_id = %ticket_id, guest_id = %guest_id, "Ticket validated");
        }

        // Lost the race with a concurrent first scan; refetch so the caller
        // still sees the recorded timestamp.
        let ticket = if first_write {
            Ticket {
                validated_at: Some(now),
                updated_at: now,
                ..ticket
            }
        } else {
            self.tickets.find_by_id(ticket_id).await?.unwrap_or(ticket)
        };

        Ok(TicketValidation {
            is_valid: true,
            already_validated: !first_write,
            ticket: Some(ticket),
            guest: Some(guest),
            event: Some(event),
            reason: None,
        })
    }
}
