//! Revocation Store
//!
//! Contract over an external key-value store for refresh-token lifecycle and
//! access-token blacklisting, with a Redis backend for production and an
//! in-memory backend for tests and development.
//!
//! Keys:
//! - `refresh_token:<token>` -> subject UUID, TTL = refresh-token lifetime
//! - `user_tokens:<subject>` -> set of outstanding refresh tokens
//! - `blacklist:<token_id>`  -> presence marker, TTL = remaining access-token
//!   lifetime at logout time (never outlives the token it blocks)

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rand::RngCore;
use thiserror::Error;
use uuid::Uuid;

mod memory;
mod redis;

pub use memory::InMemoryRevocationStore;
pub use redis::RedisRevocationStore;

/// A store-unreachable condition. Never coerced into "not blacklisted" or
/// "valid": callers fail closed on the blacklist check and fail the refresh
/// on outage.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Revocation store unavailable: {0}")]
    Unavailable(String),
}

/// Minimal capability surface needed by the auth gate and the
/// login/refresh/logout flows.
///
/// The store is shared and accessed concurrently by many request handlers; it
/// must provide atomic put-with-expiry. No in-process locking is required:
/// rotation is an atomic claim of the old entry followed by an independent
/// put of the new one, not a read-modify-write on a single key.
#[async_trait]
pub trait RevocationStore: Send + Sync {
    /// Store a refresh token with a server-enforced TTL.
    async fn put_refresh_token(
        &self,
        token: &str,
        subject: Uuid,
        ttl_seconds: u64,
    ) -> Result<(), StoreError>;

    /// Look up the subject for a refresh token without consuming it.
    async fn subject_for_refresh_token(&self, token: &str) -> Result<Option<Uuid>, StoreError>;

    /// Atomically consume a refresh token, returning its subject.
    ///
    /// Used by rotation: at most one concurrent caller can claim a given
    /// token, so duplicate issuance and lost revocation are both ruled out.
    async fn claim_refresh_token(&self, token: &str) -> Result<Option<Uuid>, StoreError>;

    /// Delete a refresh token (logout).
    async fn delete_refresh_token(&self, token: &str) -> Result<(), StoreError>;

    /// Delete every outstanding refresh token for a subject, returning the
    /// number removed.
    async fn revoke_all_refresh_tokens(&self, subject: Uuid) -> Result<u64, StoreError>;

    /// Blacklist an access-token id for the remaining lifetime of its token.
    /// Entries are never explicitly deleted; they expire naturally.
    async fn blacklist(&self, token_id: &str, ttl_seconds: u64) -> Result<(), StoreError>;

    /// Check whether an access-token id has been blacklisted.
    async fn is_blacklisted(&self, token_id: &str) -> Result<bool, StoreError>;
}

/// Generate an opaque refresh token: 32 random bytes, standard base64
/// (padded).
pub fn generate_refresh_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    BASE64.encode(bytes)
}

fn refresh_key(token: &str) -> String {
    format!("refresh_token:{}", token)
}

fn user_tokens_key(subject: Uuid) -> String {
    format!("user_tokens:{}", subject)
}

fn blacklist_key(token_id: &str) -> String {
    format!("blacklist:{}", token_id)
}
