use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Users & Roles
// ============================================================================

/// User roles with hierarchical permissions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Full access, billing
    Owner,
    /// Full access, no billing
    Admin,
    /// Event management, check-ins
    Staff,
    /// View own events, guest list
    Performer,
    /// View tickets, chat
    Guest,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Owner => "owner",
            UserRole::Admin => "admin",
            UserRole::Staff => "staff",
            UserRole::Performer => "performer",
            UserRole::Guest => "guest",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(UserRole::Owner),
            "admin" => Ok(UserRole::Admin),
            "staff" => Ok(UserRole::Staff),
            "performer" => Ok(UserRole::Performer),
            "guest" => Ok(UserRole::Guest),
            other => Err(format!("unknown user role: {}", other)),
        }
    }
}

/// A user who can access the system, always scoped to one venue
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub venue_id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

// ============================================================================
// Venues
// ============================================================================

/// A venue (tenant) that hosts events; every user and event belongs to one
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Venue {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ============================================================================
// Events
// ============================================================================

/// Event lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    /// Not yet started
    Upcoming,
    /// Currently happening
    Live,
    /// Completed
    Ended,
    /// Cancelled
    Cancelled,
}

impl EventStatus {
    /// The status transition table. Terminal states have no outgoing edges.
    pub fn allowed_transitions(self) -> &'static [EventStatus] {
        match self {
            EventStatus::Upcoming => &[EventStatus::Live, EventStatus::Cancelled],
            EventStatus::Live => &[EventStatus::Ended],
            EventStatus::Ended => &[],
            EventStatus::Cancelled => &[],
        }
    }

    pub fn can_transition_to(self, to: EventStatus) -> bool {
        self == to || self.allowed_transitions().contains(&to)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Upcoming => "upcoming",
            EventStatus::Live => "live",
            EventStatus::Ended => "ended",
            EventStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upcoming" => Ok(EventStatus::Upcoming),
            "live" => Ok(EventStatus::Live),
            "ended" => Ok(EventStatus::Ended),
            "cancelled" => Ok(EventStatus::Cancelled),
            other => Err(format!("unknown event status: {}", other)),
        }
    }
}

/// An event hosted by a venue
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,
    pub venue_id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<i32>,
    pub status: EventStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ============================================================================
// Guests
// ============================================================================

/// Type of ticket/entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum TicketType {
    General,
    Vip,
    Backstage,
    Press,
    Comp,
    GuestList,
}

impl TicketType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketType::General => "general",
            TicketType::Vip => "vip",
            TicketType::Backstage => "backstage",
            TicketType::Press => "press",
            TicketType::Comp => "comp",
            TicketType::GuestList => "guestList",
        }
    }
}

impl FromStr for TicketType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "general" => Ok(TicketType::General),
            "vip" => Ok(TicketType::Vip),
            "backstage" => Ok(TicketType::Backstage),
            "press" => Ok(TicketType::Press),
            "comp" => Ok(TicketType::Comp),
            "guestList" => Ok(TicketType::GuestList),
            other => Err(format!("unknown ticket type: {}", other)),
        }
    }
}

/// A guest on an event's guest list
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Guest {
    pub id: Uuid,
    pub event_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    pub ticket_type: TicketType,
    pub is_checked_in: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checked_in_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Guest {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

// ============================================================================
// Tickets
// ============================================================================

/// A digital ticket carrying a signed QR payload.
///
/// `qr_code` and `hmac_signature` are co-located but validated independently:
/// signature validity never implies database validity, and vice versa.
/// `validated_at` is set at most once; `is_valid` can be flipped to false
/// out-of-band by administrative revocation.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: Uuid,
    pub event_id: Uuid,
    pub guest_id: Uuid,
    pub qr_code: String,
    pub hmac_signature: String,
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transition_table() {
        assert!(EventStatus::Upcoming.can_transition_to(EventStatus::Live));
        assert!(EventStatus::Upcoming.can_transition_to(EventStatus::Cancelled));
        assert!(!EventStatus::Upcoming.can_transition_to(EventStatus::Ended));

        assert!(EventStatus::Live.can_transition_to(EventStatus::Ended));
        assert!(!EventStatus::Live.can_transition_to(EventStatus::Upcoming));
        assert!(!EventStatus::Live.can_transition_to(EventStatus::Cancelled));

        // Terminal states have no outgoing edges
        for terminal in [EventStatus::Ended, EventStatus::Cancelled] {
            assert!(terminal.allowed_transitions().is_empty());
        }
    }

    #[test]
    fn test_self_transition_is_noop() {
        for status in [
            EventStatus::Upcoming,
            EventStatus::Live,
            EventStatus::Ended,
            EventStatus::Cancelled,
        ] {
            assert!(status.can_transition_to(status));
        }
    }

    #[test]
    fn test_role_round_trip() {
        for role in [
            UserRole::Owner,
            UserRole::Admin,
            UserRole::Staff,
            UserRole::Performer,
            UserRole::Guest,
        ] {
            assert_eq!(role.as_str().parse::<UserRole>().unwrap(), role);
        }
        assert!("superuser".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_role_serde_lowercase() {
        assert_eq!(serde_json::to_string(&UserRole::Owner).unwrap(), "\"owner\"");
        assert_eq!(
            serde_json::from_str::<UserRole>("\"staff\"").unwrap(),
            UserRole::Staff
        );
    }

    #[test]
    fn test_user_serialization_hides_password_hash() {
        let user = User {
            id: Uuid::new_v4(),
            venue_id: Uuid::new_v4(),
            email: "owner@example.com".to_string(),
            password_hash: "secret-hash".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            role: UserRole::Owner,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret-hash"));
        assert!(json.contains("firstName"));
        assert_eq!(user.full_name(), "Ada Lovelace");
    }
}
