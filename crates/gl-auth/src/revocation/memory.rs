//! In-memory revocation store for tests and local development.
//!
//! Honors TTLs on read, which is enough to exercise the lifecycle contracts
//! without a running Redis.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};
use uuid::Uuid;

use super::{RevocationStore, StoreError};

#[derive(Default)]
struct Inner {
    refresh_tokens: HashMap<String, (Uuid, Instant)>,
    user_tokens: HashMap<Uuid, HashSet<String>>,
    blacklist: HashMap<String, Instant>,
}

#[derive(Default)]
pub struct InMemoryRevocationStore {
    inner: Mutex<Inner>,
}

impl InMemoryRevocationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RevocationStore for InMemoryRevocationStore {
    async fn put_refresh_token(
        &self,
        token: &str,
        subject: Uuid,
        ttl_seconds: u64,
    ) -> Result<(), StoreError> {
        let expires = Instant::now() + Duration::from_secs(ttl_seconds);
        let mut inner = self.inner.lock();
        inner
            .refresh_tokens
            .insert(token.to_string(), (subject, expires));
        inner
            .user_tokens
            .entry(subject)
            .or_default()
            .insert(token.to_string());
        Ok(())
    }

    async fn subject_for_refresh_token(&self, token: &str) -> Result<Option<Uuid>, StoreError> {
        let inner = self.inner.lock();
        Ok(inner
            .refresh_tokens
            .get(token)
            .filter(|(_, expires)| *expires > Instant::now())
            .map(|(subject, _)| *subject))
    }

    async fn claim_refresh_token(&self, token: &str) -> Result<Option<Uuid>, StoreError> {
        let mut inner = self.inner.lock();
        let claimed = inner
            .refresh_tokens
            .remove(token)
            .filter(|(_, expires)| *expires > Instant::now())
            .map(|(subject, _)| subject);
        if let Some(subject) = claimed {
            if let Some(tokens) = inner.user_tokens.get_mut(&subject) {
                tokens.remove(token);
            }
        }
        Ok(claimed)
    }

    async fn delete_refresh_token(&self, token: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        if let Some((subject, _)) = inner.refresh_tokens.remove(token) {
            if let Some(tokens) = inner.user_tokens.get_mut(&subject) {
                tokens.remove(token);
            }
        }
        Ok(())
    }

    async fn revoke_all_refresh_tokens(&self, subject: Uuid) -> Result<u64, StoreError> {
        let mut inner = self.inner.lock();
        let tokens = inner.user_tokens.remove(&subject).unwrap_or_default();
        let mut deleted = 0u64;
        for token in tokens {
            if inner.refresh_tokens.remove(&token).is_some() {
                deleted += 1;
            }
        }
        Ok(deleted)
    }

    async fn blacklist(&self, token_id: &str, ttl_seconds: u64) -> Result<(), StoreError> {
        let expires = Instant::now() + Duration::from_secs(ttl_seconds.max(1));
        self.inner.lock().blacklist.insert(token_id.to_string(), expires);
        Ok(())
    }

    async fn is_blacklisted(&self, token_id: &str) -> Result<bool, StoreError> {
        let inner = self.inner.lock();
        Ok(inner
            .blacklist
            .get(token_id)
            .map(|expires| *expires > Instant::now())
            .unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::revocation::generate_refresh_token;

    #[tokio::test]
    async fn test_refresh_token_lifecycle() {
        let store = InMemoryRevocationStore::new();
        let subject = Uuid::new_v4();
        let token = generate_refresh_token();

        store.put_refresh_token(&token, subject, 60).await.unwrap();
        assert_eq!(
            store.subject_for_refresh_token(&token).await.unwrap(),
            Some(subject)
        );

        store.delete_refresh_token(&token).await.unwrap();
        assert_eq!(store.subject_for_refresh_token(&token).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_unknown_token_is_absent() {
        let store = InMemoryRevocationStore::new();
        assert_eq!(
            store.subject_for_refresh_token("no-such-token").await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_claim_consumes_token_exactly_once() {
        let store = InMemoryRevocationStore::new();
        let subject = Uuid::new_v4();
        let token = generate_refresh_token();
        store.put_refresh_token(&token, subject, 60).await.unwrap();

        assert_eq!(
            store.claim_refresh_token(&token).await.unwrap(),
            Some(subject)
        );
        // Second claim with the same token finds nothing
        assert_eq!(store.claim_refresh_token(&token).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_revoke_all_for_subject() {
        let store = InMemoryRevocationStore::new();
        let subject = Uuid::new_v4();
        let other = Uuid::new_v4();

        let t1 = generate_refresh_token();
        let t2 = generate_refresh_token();
        let t3 = generate_refresh_token();
        store.put_refresh_token(&t1, subject, 60).await.unwrap();
        store.put_refresh_token(&t2, subject, 60).await.unwrap();
        store.put_refresh_token(&t3, other, 60).await.unwrap();

        assert_eq!(store.revoke_all_refresh_tokens(subject).await.unwrap(), 2);
        assert_eq!(store.subject_for_refresh_token(&t1).await.unwrap(), None);
        assert_eq!(store.subject_for_refresh_token(&t2).await.unwrap(), None);
        // Other subjects untouched
        assert_eq!(
            store.subject_for_refresh_token(&t3).await.unwrap(),
            Some(other)
        );
    }

    #[tokio::test]
    async fn test_blacklist() {
        let store = InMemoryRevocationStore::new();
        assert!(!store.is_blacklisted("jti-1").await.unwrap());

        store.blacklist("jti-1", 3600).await.unwrap();
        assert!(store.is_blacklisted("jti-1").await.unwrap());
        assert!(!store.is_blacklisted("jti-2").await.unwrap());
    }
}
