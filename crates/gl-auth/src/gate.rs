//! Authentication Gate
//!
//! Per-request pipeline: extract the bearer credential, verify the token
//! signature and expiry, check the blacklist, and produce an authenticated
//! identity. Verification itself is read-only; nothing is mutated beyond the
//! blacklist lookup.

use std::sync::Arc;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::revocation::RevocationStore;
use crate::token::{AuthError, TokenCodec};
use gl_common::UserRole;

/// Why a request was rejected.
#[derive(Error, Debug)]
pub enum AuthRejection {
    #[error("Missing or invalid Authorization header")]
    MalformedHeader,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    Expired,

    #[error("Token has been revoked")]
    Revoked,

    /// The revocation store could not be reached. This must stay distinct
    /// from the other rejections: treating an outage as "not blacklisted"
    /// would defeat revocation, so callers fail closed.
    #[error("Revocation store unavailable: {0}")]
    StoreUnavailable(String),
}

/// The authenticated identity handed to business handlers.
#[derive(Debug, Clone)]
pub struct AuthIdentity {
    pub user_id: Uuid,
    pub role: UserRole,
    pub venue_id: Uuid,
    /// Token id, needed when the token itself is later blacklisted
    pub token_id: String,
    /// Token expiry (seconds since epoch); bounds the blacklist TTL
    pub expires_at: i64,
}

impl AuthIdentity {
    pub fn has_any_role(&self, roles: &[UserRole]) -> bool {
        roles.contains(&self.role)
    }

    /// Seconds until the backing token expires, clamped at zero.
    pub fn remaining_ttl_seconds(&self) -> u64 {
        (self.expires_at - chrono::Utc::now().timestamp()).max(0) as u64
    }
}

/// Extract the token from an `Authorization` header value. The format must
/// be exactly `Bearer <token>`.
pub fn extract_bearer_token(header: &str) -> Option<&str> {
    let token = header.strip_prefix("Bearer ")?;
    if token.is_empty() || token.contains(' ') {
        return None;
    }
    Some(token)
}

/// Orchestrates per-request authentication.
pub struct AuthGate {
    codec: TokenCodec,
    store: Arc<dyn RevocationStore>,
}

impl AuthGate {
    pub fn new(codec: TokenCodec, store: Arc<dyn RevocationStore>) -> Self {
        Self { codec, store }
    }

    /// Run the full pipeline against an optional `Authorization` header.
    pub async fn authenticate(
        &self,
        authorization: Option<&str>,
    ) -> Result<AuthIdentity, AuthRejection> {
        let token = authorization
            .and_then(extract_bearer_token)
            .ok_or(AuthRejection::MalformedHeader)?;

        let claims = self.codec.verify(token).map_err(|e| match e {
            AuthError::TokenExpired => AuthRejection::Expired,
            _ => AuthRejection::InvalidToken,
        })?;

        let blacklisted = self
            .store
            .is_blacklisted(&claims.jti)
            .await
            .map_err(|e| AuthRejection::StoreUnavailable(e.to_string()))?;
        if blacklisted {
            warn!(token_id = %claims.jti, user_id = %claims.sub, "Attempt to use revoked token");
            return Err(AuthRejection::Revoked);
        }

        Ok(AuthIdentity {
            user_id: claims.sub,
            role: claims.role,
            venue_id: claims.venue_id,
            token_id: claims.jti,
            expires_at: claims.exp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::revocation::{InMemoryRevocationStore, StoreError};
    use crate::token::AccessClaims;
    use async_trait::async_trait;
    use chrono::Duration;

    const SECRET: &str = "test-signing-secret";

    fn gate_with_store(store: Arc<dyn RevocationStore>) -> AuthGate {
        AuthGate::new(TokenCodec::new(SECRET), store)
    }

    fn gate() -> AuthGate {
        gate_with_store(Arc::new(InMemoryRevocationStore::new()))
    }

    fn mint(ttl: Duration) -> (String, AccessClaims) {
        let claims = AccessClaims::new(
            Uuid::new_v4(),
            UserRole::Staff,
            Uuid::new_v4(),
            ttl,
        );
        let token = TokenCodec::new(SECRET).mint(&claims).unwrap();
        (token, claims)
    }

    /// Store double that is always unreachable.
    struct UnreachableStore;

    #[async_trait]
    impl RevocationStore for UnreachableStore {
        async fn put_refresh_token(&self, _: &str, _: Uuid, _: u64) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }
        async fn subject_for_refresh_token(&self, _: &str) -> Result<Option<Uuid>, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }
        async fn claim_refresh_token(&self, _: &str) -> Result<Option<Uuid>, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }
        async fn delete_refresh_token(&self, _: &str) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }
        async fn revoke_all_refresh_tokens(&self, _: Uuid) -> Result<u64, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }
        async fn blacklist(&self, _: &str, _: u64) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }
        async fn is_blacklisted(&self, _: &str) -> Result<bool, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn test_valid_token_authenticates() {
        let (token, claims) = mint(Duration::hours(1));
        let header = format!("Bearer {}", token);

        let identity = gate().authenticate(Some(&header)).await.unwrap();
        assert_eq!(identity.user_id, claims.sub);
        assert_eq!(identity.role, UserRole::Staff);
        assert_eq!(identity.venue_id, claims.venue_id);
        assert_eq!(identity.token_id, claims.jti);
    }

    #[tokio::test]
    async fn test_missing_header_rejected() {
        assert!(matches!(
            gate().authenticate(None).await,
            Err(AuthRejection::MalformedHeader)
        ));
    }

    #[tokio::test]
    async fn test_malformed_header_rejected() {
        let gate = gate();
        for header in ["Token abc", "Bearer", "Bearer ", "bearer abc", "Bearer a b"] {
            assert!(
                matches!(
                    gate.authenticate(Some(header)).await,
                    Err(AuthRejection::MalformedHeader)
                ),
                "header {:?} should be rejected as malformed",
                header
            );
        }
    }

    #[tokio::test]
    async fn test_garbage_token_rejected() {
        let header = "Bearer not.a.token";
        assert!(matches!(
            gate().authenticate(Some(header)).await,
            Err(AuthRejection::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn test_expired_token_rejected() {
        let (token, _) = mint(Duration::seconds(-60));
        let header = format!("Bearer {}", token);
        assert!(matches!(
            gate().authenticate(Some(&header)).await,
            Err(AuthRejection::Expired)
        ));
    }

    #[tokio::test]
    async fn test_blacklisted_token_rejected() {
        let store = Arc::new(InMemoryRevocationStore::new());
        let gate = gate_with_store(store.clone());

        let (token, claims) = mint(Duration::hours(1));
        let header = format!("Bearer {}", token);

        // Valid before revocation
        assert!(gate.authenticate(Some(&header)).await.is_ok());

        store.blacklist(&claims.jti, 3600).await.unwrap();
        assert!(matches!(
            gate.authenticate(Some(&header)).await,
            Err(AuthRejection::Revoked)
        ));
    }

    #[tokio::test]
    async fn test_store_outage_fails_closed() {
        let gate = gate_with_store(Arc::new(UnreachableStore));
        let (token, _) = mint(Duration::hours(1));
        let header = format!("Bearer {}", token);

        // A valid signature is not enough when the blacklist cannot be
        // consulted.
        assert!(matches!(
            gate.authenticate(Some(&header)).await,
            Err(AuthRejection::StoreUnavailable(_))
        ));
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("Basic abc"), None);
        assert_eq!(extract_bearer_token("Bearer "), None);
        assert_eq!(extract_bearer_token("abc"), None);
    }

    #[test]
    fn test_role_membership() {
        let identity = AuthIdentity {
            user_id: Uuid::new_v4(),
            role: UserRole::Staff,
            venue_id: Uuid::new_v4(),
            token_id: "jti".to_string(),
            expires_at: chrono::Utc::now().timestamp() + 3600,
        };
        assert!(identity.has_any_role(&[UserRole::Owner, UserRole::Admin, UserRole::Staff]));
        assert!(!identity.has_any_role(&[UserRole::Owner, UserRole::Admin]));
        assert!(identity.remaining_ttl_seconds() > 0);
    }
}
