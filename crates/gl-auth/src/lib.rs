//! GuestList authentication core
//!
//! Provides:
//! - Signed access tokens (HMAC-SHA256, `header.payload.signature`)
//! - Signed ticket QR payloads for offline validation
//! - Refresh-token storage and access-token blacklisting over Redis
//! - The per-request authentication gate
//!
//! Token and ticket verification are stateless: a single process, the shared
//! secret, and the token bytes are sufficient, so verification scales
//! horizontally without a shared session store. Only revocation requires
//! external state, which is why the blacklist check is a separate step.

pub mod gate;
pub mod revocation;
pub mod ticket;
pub mod token;

pub use gate::{extract_bearer_token, AuthGate, AuthIdentity, AuthRejection};
pub use revocation::{
    generate_refresh_token, InMemoryRevocationStore, RedisRevocationStore, RevocationStore,
    StoreError,
};
pub use ticket::{parse_qr_code, TicketError, TicketSigner};
pub use token::{AccessClaims, AuthError, TokenCodec};

/// Authentication configuration
///
/// The signing secret is shared by token and ticket signing and must be
/// externally supplied; lifetimes fall back to sane defaults (24h / 30d).
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Shared HMAC signing secret
    pub signing_secret: String,
    /// Access-token lifetime in hours
    pub access_token_ttl_hours: i64,
    /// Refresh-token lifetime in days
    pub refresh_token_ttl_days: i64,
}

impl AuthConfig {
    pub fn new(signing_secret: impl Into<String>) -> Self {
        Self {
            signing_secret: signing_secret.into(),
            access_token_ttl_hours: 24,
            refresh_token_ttl_days: 30,
        }
    }

    /// Create config from environment variables.
    ///
    /// `GL_SIGNING_SECRET` is required; there is deliberately no default.
    pub fn from_env() -> Result<Self, AuthError> {
        let signing_secret = std::env::var("GL_SIGNING_SECRET")
            .map_err(|_| AuthError::Configuration("GL_SIGNING_SECRET is not set".to_string()))?;

        let access_token_ttl_hours = std::env::var("GL_ACCESS_TOKEN_TTL_HOURS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(24);
        let refresh_token_ttl_days = std::env::var("GL_REFRESH_TOKEN_TTL_DAYS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(30);

        Ok(Self {
            signing_secret,
            access_token_ttl_hours,
            refresh_token_ttl_days,
        })
    }

    pub fn access_token_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.access_token_ttl_hours)
    }

    pub fn access_token_ttl_seconds(&self) -> u64 {
        (self.access_token_ttl_hours * 3600).max(0) as u64
    }

    pub fn refresh_token_ttl_seconds(&self) -> u64 {
        (self.refresh_token_ttl_days * 24 * 3600).max(0) as u64
    }
}
