//! Event business rules.
//!
//! Small pure predicates over domain values. Kept free of I/O so they stay
//! exhaustively testable.

use chrono::{DateTime, Utc};
use gl_common::{Event, EventStatus};

use crate::error::{PlatformError, Result};

/// Enforce the status transition table. Self-transitions pass as no-ops.
pub fn validate_status_transition(from: EventStatus, to: EventStatus) -> Result<()> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(PlatformError::validation(format!(
            "Event cannot transition from {} to {}",
            from, to
        )))
    }
}

/// Event details can only be edited before the event reaches a terminal
/// state.
pub fn require_modifiable(event: &Event) -> Result<()> {
    match event.status {
        EventStatus::Upcoming | EventStatus::Live => Ok(()),
        EventStatus::Ended | EventStatus::Cancelled => Err(PlatformError::validation(format!(
            "Event is {} and can no longer be modified",
            event.status
        ))),
    }
}

/// Tickets can only be issued or checked in while the event is upcoming or
/// live.
pub fn require_check_in_open(event: &Event) -> Result<()> {
    match event.status {
        EventStatus::Upcoming | EventStatus::Live => Ok(()),
        EventStatus::Ended | EventStatus::Cancelled => Err(PlatformError::validation(format!(
            "Event is {}",
            event.status
        ))),
    }
}

/// Guest additions must respect the event capacity when one is set.
pub fn validate_capacity(event: &Event, current_guest_count: i64) -> Result<()> {
    if let Some(capacity) = event.capacity {
        if current_guest_count >= capacity as i64 {
            return Err(PlatformError::validation("Event is at capacity"));
        }
    }
    Ok(())
}

pub fn validate_event_dates(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<()> {
    if end <= start {
        return Err(PlatformError::validation(
            "Event end time must be after start time",
        ));
    }
    Ok(())
}
