//! Postgres repositories.
//!
//! Enum columns are stored as TEXT in their wire spelling and parsed on read,
//! so the schema stays legible in psql.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use gl_common::{Event, EventStatus, Guest, Ticket, TicketType, User, UserRole, Venue};

use super::{EventRepository, GuestRepository, TicketRepository, UserRepository, VenueRepository};
use crate::error::{PlatformError, Result};

/// Create the schema if it does not exist. Run once at startup.
pub async fn init_schema(pool: &PgPool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS venues (
            id UUID PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            address TEXT,
            is_active BOOLEAN NOT NULL DEFAULT TRUE,
            created_at TIMESTAMPTZ NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL
        );

        CREATE TABLE IF NOT EXISTS users (
            id UUID PRIMARY KEY,
            venue_id UUID NOT NULL REFERENCES venues(id),
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            role TEXT NOT NULL,
            is_active BOOLEAN NOT NULL DEFAULT TRUE,
            created_at TIMESTAMPTZ NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_users_email ON users(email);

        CREATE TABLE IF NOT EXISTS events (
            id UUID PRIMARY KEY,
            venue_id UUID NOT NULL REFERENCES venues(id),
            name TEXT NOT NULL,
            description TEXT,
            start_time TIMESTAMPTZ NOT NULL,
            end_time TIMESTAMPTZ NOT NULL,
            location TEXT,
            capacity INTEGER,
            status TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_events_venue ON events(venue_id);

        CREATE TABLE IF NOT EXISTS guests (
            id UUID PRIMARY KEY,
            event_id UUID NOT NULL REFERENCES events(id),
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            email TEXT,
            phone_number TEXT,
            ticket_type TEXT NOT NULL,
            is_checked_in BOOLEAN NOT NULL DEFAULT FALSE,
            checked_in_at TIMESTAMPTZ,
            notes TEXT,
            created_at TIMESTAMPTZ NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_guests_event ON guests(event_id);

        CREATE TABLE IF NOT EXISTS tickets (
            id UUID PRIMARY KEY,
            event_id UUID NOT NULL REFERENCES events(id),
            guest_id UUID NOT NULL REFERENCES guests(id),
            qr_code TEXT NOT NULL,
            hmac_signature TEXT NOT NULL,
            is_valid BOOLEAN NOT NULL DEFAULT TRUE,
            validated_at TIMESTAMPTZ,
            created_at TIMESTAMPTZ NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_tickets_guest ON tickets(guest_id);
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

fn parse_enum<T: std::str::FromStr<Err = String>>(value: String) -> Result<T> {
    value.parse::<T>().map_err(PlatformError::internal)
}

fn map_user(row: PgRow) -> Result<User> {
    Ok(User {
        id: row.get("id"),
        venue_id: row.get("venue_id"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        role: parse_enum::<UserRole>(row.get("role"))?,
        is_active: row.get("is_active"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn map_event(row: PgRow) -> Result<Event> {
    Ok(Event {
        id: row.get("id"),
        venue_id: row.get("venue_id"),
        name: row.get("name"),
        description: row.get("description"),
        start_time: row.get("start_time"),
        end_time: row.get("end_time"),
        location: row.get("location"),
        capacity: row.get("capacity"),
        status: parse_enum::<EventStatus>(row.get("status"))?,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn map_guest(row: PgRow) -> Result<Guest> {
    Ok(Guest {
        id: row.get("id"),
        event_id: row.get("event_id"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        email: row.get("email"),
        phone_number: row.get("phone_number"),
        ticket_type: parse_enum::<TicketType>(row.get("ticket_type"))?,
        is_checked_in: row.get("is_checked_in"),
        checked_in_at: row.get("checked_in_at"),
        notes: row.get("notes"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn map_ticket(row: PgRow) -> Ticket {
    Ticket {
        id: row.get("id"),
        event_id: row.get("event_id"),
        guest_id: row.get("guest_id"),
        qr_code: row.get("qr_code"),
        hmac_signature: row.get("hmac_signature"),
        is_valid: row.get("is_valid"),
        validated_at: row.get("validated_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn map_venue(row: PgRow) -> Venue {
    Venue {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        address: row.get("address"),
        is_active: row.get("is_active"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(map_user).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        row.map(map_user).transpose()
    }

    async fn insert(&self, user: &User) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, venue_id, email, password_hash, first_name, last_name, role, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(user.id)
        .bind(user.venue_id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.role.as_str())
        .bind(user.is_active)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

pub struct PostgresVenueRepository {
    pool: PgPool,
}

impl PostgresVenueRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VenueRepository for PostgresVenueRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Venue>> {
        let row = sqlx::query("SELECT * FROM venues WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(map_venue))
    }

    async fn insert(&self, venue: &Venue) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO venues (id, name, email, address, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(venue.id)
        .bind(&venue.name)
        .bind(&venue.email)
        .bind(&venue.address)
        .bind(venue.is_active)
        .bind(venue.created_at)
        .bind(venue.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update(&self, venue: &Venue) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE venues
            SET name = $2, email = $3, address = $4, is_active = $5, updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(venue.id)
        .bind(&venue.name)
        .bind(&venue.email)
        .bind(&venue.address)
        .bind(venue.is_active)
        .bind(venue.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

pub struct PostgresEventRepository {
    pool: PgPool,
}

impl PostgresEventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventRepository for PostgresEventRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Event>> {
        let row = sqlx::query("SELECT * FROM events WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(map_event).transpose()
    }

    async fn list_by_venue(
        &self,
        venue_id: Uuid,
        status: Option<EventStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Event>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM events
            WHERE venue_id = $1 AND ($2::TEXT IS NULL OR status = $2)
            ORDER BY start_time DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(venue_id)
        .bind(status.map(|s| s.as_str()))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(map_event).collect()
    }

    async fn count_by_venue(&self, venue_id: Uuid, status: Option<EventStatus>) -> Result<i64> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS count FROM events
            WHERE venue_id = $1 AND ($2::TEXT IS NULL OR status = $2)
            "#,
        )
        .bind(venue_id)
        .bind(status.map(|s| s.as_str()))
        .fetch_one(&self.pool)
        .await?;
        Ok(row.get("count"))
    }

    async fn insert(&self, event: &Event) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO events (id, venue_id, name, description, start_time, end_time, location, capacity, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(event.id)
        .bind(event.venue_id)
        .bind(&event.name)
        .bind(&event.description)
        .bind(event.start_time)
        .bind(event.end_time)
        .bind(&event.location)
        .bind(event.capacity)
        .bind(event.status.as_str())
        .bind(event.created_at)
        .bind(event.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update(&self, event: &Event) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE events
            SET name = $2, description = $3, start_time = $4, end_time = $5,
                location = $6, capacity = $7, updated_at = $8
            WHERE id = $1
            "#,
        )
        .bind(event.id)
        .bind(&event.name)
        .bind(&event.description)
        .bind(event.start_time)
        .bind(event.end_time)
        .bind(&event.location)
        .bind(event.capacity)
        .bind(event.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_status(&self, id: Uuid, status: EventStatus) -> Result<()> {
        sqlx::query("UPDATE events SET status = $2, updated_at = $3 WHERE id = $1")
            .bind(id)
            .bind(status.as_str())
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        // Children first; the schema has no ON DELETE CASCADE
        sqlx::query("DELETE FROM tickets WHERE event_id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        sqlx::query("DELETE FROM guests WHERE event_id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

pub struct PostgresGuestRepository {
    pool: PgPool,
}

impl PostgresGuestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GuestRepository for PostgresGuestRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Guest>> {
        let row = sqlx::query("SELECT * FROM guests WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(map_guest).transpose()
    }

    async fn insert(&self, guest: &Guest) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO guests (id, event_id, first_name, last_name, email, phone_number, ticket_type, is_checked_in, checked_in_at, notes, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(guest.id)
        .bind(guest.event_id)
        .bind(&guest.first_name)
        .bind(&guest.last_name)
        .bind(&guest.email)
        .bind(&guest.phone_number)
        .bind(guest.ticket_type.as_str())
        .bind(guest.is_checked_in)
        .bind(guest.checked_in_at)
        .bind(&guest.notes)
        .bind(guest.created_at)
        .bind(guest.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn count_by_event(&self, event_id: Uuid) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM guests WHERE event_id = $1")
            .bind(event_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("count"))
    }

    async fn list_by_event(&self, event_id: Uuid) -> Result<Vec<Guest>> {
        let rows =
            sqlx::query("SELECT * FROM guests WHERE event_id = $1 ORDER BY created_at ASC")
                .bind(event_id)
                .fetch_all(&self.pool)
                .await?;
        rows.into_iter().map(map_guest).collect()
    }

    async fn mark_checked_in(&self, id: Uuid, at: DateTime<Utc>) -> Result<()> {
        sqlx::query(
            "UPDATE guests SET is_checked_in = TRUE, checked_in_at = $2, updated_at = $2 WHERE id = $1",
        )
        .bind(id)
        .bind(at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

pub struct PostgresTicketRepository {
    pool: PgPool,
}

impl PostgresTicketRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TicketRepository for PostgresTicketRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Ticket>> {
        let row = sqlx::query("SELECT * FROM tickets WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(map_ticket))
    }

    async fn find_by_guest(&self, guest_id: Uuid) -> Result<Option<Ticket>> {
        let row = sqlx::query("SELECT * FROM tickets WHERE guest_id = $1 ORDER BY created_at DESC LIMIT 1")
            .bind(guest_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(map_ticket))
    }

    async fn insert(&self, ticket: &Ticket) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO tickets (id, event_id, guest_id, qr_code, hmac_signature, is_valid, validated_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(ticket.id)
        .bind(ticket.event_id)
        .bind(ticket.guest_id)
        .bind(&ticket.qr_code)
        .bind(&ticket.hmac_signature)
        .bind(ticket.is_valid)
        .bind(ticket.validated_at)
        .bind(ticket.created_at)
        .bind(ticket.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn mark_validated_if_unset(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool> {
        // The WHERE clause makes concurrent first validations race safely:
        // exactly one UPDATE matches.
        let result = sqlx::query(
            "UPDATE tickets SET validated_at = $2, updated_at = $2 WHERE id = $1 AND validated_at IS NULL",
        )
        .bind(id)
        .bind(at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn invalidate(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE tickets SET is_valid = FALSE, updated_at = $2 WHERE id = $1 AND is_valid = TRUE",
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
