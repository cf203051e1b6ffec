//! Redis-backed revocation store.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{blacklist_key, refresh_key, user_tokens_key, RevocationStore, StoreError};

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

/// Revocation store over a shared Redis instance.
///
/// `ConnectionManager` multiplexes and reconnects internally, so the store is
/// cheap to clone into per-request handlers.
#[derive(Clone)]
pub struct RedisRevocationStore {
    conn: ConnectionManager,
}

impl RedisRevocationStore {
    pub async fn connect(redis_url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let conn = client.get_connection_manager().await?;
        Ok(Self { conn })
    }

    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl RevocationStore for RedisRevocationStore {
    async fn put_refresh_token(
        &self,
        token: &str,
        subject: Uuid,
        ttl_seconds: u64,
    ) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();

        let _: () = conn
            .set_ex(refresh_key(token), subject.to_string(), ttl_seconds)
            .await?;

        // Track the token in the subject's set for bulk revocation. The set
        // expires with the newest token so it cannot outlive its members.
        let user_key = user_tokens_key(subject);
        let _: () = conn.sadd(&user_key, token).await?;
        let _: () = conn.expire(&user_key, ttl_seconds as i64).await?;

        debug!(subject = %subject, ttl_seconds, "Stored refresh token");
        Ok(())
    }

    async fn subject_for_refresh_token(&self, token: &str) -> Result<Option<Uuid>, StoreError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(refresh_key(token)).await?;
        Ok(value.and_then(|v| parse_subject(&v)))
    }

    async fn claim_refresh_token(&self, token: &str) -> Result<Option<Uuid>, StoreError> {
        let mut conn = self.conn.clone();

        // GETDEL makes the claim atomic: concurrent rotations with the same
        // token cannot both succeed.
        let value: Option<String> = conn.get_del(refresh_key(token)).await?;
        let subject = match value.and_then(|v| parse_subject(&v)) {
            Some(subject) => subject,
            None => return Ok(None),
        };

        let _: () = conn.srem(user_tokens_key(subject), token).await?;
        debug!(subject = %subject, "Claimed refresh token");
        Ok(Some(subject))
    }

    async fn delete_refresh_token(&self, token: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let key = refresh_key(token);

        // Fetch the subject first to keep its token set consistent.
        let value: Option<String> = conn.get(&key).await?;
        if let Some(subject) = value.and_then(|v| parse_subject(&v)) {
            let _: () = conn.srem(user_tokens_key(subject), token).await?;
        }

        let _: () = conn.del(&key).await?;
        Ok(())
    }

    async fn revoke_all_refresh_tokens(&self, subject: Uuid) -> Result<u64, StoreError> {
        let mut conn = self.conn.clone();
        let user_key = user_tokens_key(subject);

        let tokens: Vec<String> = conn.smembers(&user_key).await?;
        let mut deleted = 0u64;
        for token in &tokens {
            let removed: i64 = conn.del(refresh_key(token)).await?;
            deleted += removed.max(0) as u64;
        }
        let _: () = conn.del(&user_key).await?;

        debug!(subject = %subject, deleted, "Revoked all refresh tokens");
        Ok(deleted)
    }

    async fn blacklist(&self, token_id: &str, ttl_seconds: u64) -> Result<(), StoreError> {
        // A token at the edge of expiry still gets a 1s marker so the write
        // is unconditional.
        let ttl = ttl_seconds.max(1);
        let mut conn = self.conn.clone();
        let _: () = conn.set_ex(blacklist_key(token_id), "1", ttl).await?;
        debug!(token_id, ttl, "Blacklisted access token");
        Ok(())
    }

    async fn is_blacklisted(&self, token_id: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let exists: bool = conn.exists(blacklist_key(token_id)).await?;
        Ok(exists)
    }
}

fn parse_subject(value: &str) -> Option<Uuid> {
    match Uuid::parse_str(value) {
        Ok(subject) => Some(subject),
        Err(_) => {
            warn!(value, "Invalid subject stored for refresh token");
            None
        }
    }
}
