//! Access Token Codec
//!
//! Mints and verifies compact signed tokens of the form
//! `base64url(header).base64url(payload).base64url(signature)`, all segments
//! unpadded, signed with HMAC-SHA256 under the shared secret.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{Duration, Utc};
use gl_common::UserRole;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Header is fixed; the system supports exactly one algorithm.
const TOKEN_HEADER: &str = r#"{"alg":"HS256","typ":"JWT"}"#;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Token generation failed: {0}")]
    TokenGeneration(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Claims carried by an access token. Immutable once minted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Token id, unique per mint; the handle used for blacklisting
    pub jti: String,
    /// Subject (user id)
    pub sub: Uuid,
    /// Expiration, integer seconds since epoch
    pub exp: i64,
    /// Issued at, integer seconds since epoch
    pub iat: i64,
    pub role: UserRole,
    #[serde(rename = "venueID")]
    pub venue_id: Uuid,
}

impl AccessClaims {
    /// Mint fresh claims for a user. `exp > iat` holds for any positive ttl.
    pub fn new(sub: Uuid, role: UserRole, venue_id: Uuid, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            jti: Uuid::new_v4().to_string(),
            sub,
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
            role,
            venue_id,
        }
    }

    /// Seconds until expiry, clamped at zero. Used to bound blacklist TTLs so
    /// a blacklist entry never outlives the token it blocks.
    pub fn remaining_ttl_seconds(&self) -> u64 {
        (self.exp - Utc::now().timestamp()).max(0) as u64
    }
}

/// Stateless encoder/verifier for access tokens.
#[derive(Clone)]
pub struct TokenCodec {
    key: Vec<u8>,
}

impl TokenCodec {
    pub fn new(signing_secret: &str) -> Self {
        Self {
            key: signing_secret.as_bytes().to_vec(),
        }
    }

    /// Serialize and sign claims into a three-segment token.
    pub fn mint(&self, claims: &AccessClaims) -> Result<String, AuthError> {
        let payload =
            serde_json::to_vec(claims).map_err(|e| AuthError::TokenGeneration(e.to_string()))?;

        let header_b64 = URL_SAFE_NO_PAD.encode(TOKEN_HEADER.as_bytes());
        let payload_b64 = URL_SAFE_NO_PAD.encode(&payload);

        let mut mac = self.mac()?;
        mac.update(header_b64.as_bytes());
        mac.update(b".");
        mac.update(payload_b64.as_bytes());
        let signature_b64 = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{}.{}.{}", header_b64, payload_b64, signature_b64))
    }

    /// Verify a token's signature and expiry, returning its claims.
    ///
    /// The signature comparison goes through `Mac::verify_slice`, which is
    /// constant-time on the signature bytes.
    pub fn verify(&self, token: &str) -> Result<AccessClaims, AuthError> {
        let parts: Vec<&str> = token.split('.').collect();
        if parts.len() != 3 {
            return Err(AuthError::InvalidToken);
        }

        let signature = decode_b64url(parts[2]).ok_or(AuthError::InvalidToken)?;

        let mut mac = self.mac().map_err(|_| AuthError::InvalidToken)?;
        mac.update(parts[0].as_bytes());
        mac.update(b".");
        mac.update(parts[1].as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| AuthError::InvalidToken)?;

        let payload = decode_b64url(parts[1]).ok_or(AuthError::InvalidToken)?;
        let claims: AccessClaims =
            serde_json::from_slice(&payload).map_err(|_| AuthError::InvalidToken)?;

        if claims.exp <= Utc::now().timestamp() {
            return Err(AuthError::TokenExpired);
        }

        Ok(claims)
    }

    fn mac(&self) -> Result<HmacSha256, AuthError> {
        HmacSha256::new_from_slice(&self.key)
            .map_err(|_| AuthError::TokenGeneration("invalid HMAC key".to_string()))
    }
}

/// Decode base64url, tolerating both padded and unpadded input.
fn decode_b64url(input: &str) -> Option<Vec<u8>> {
    URL_SAFE_NO_PAD.decode(input.trim_end_matches('=')).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> TokenCodec {
        TokenCodec::new("test-signing-secret")
    }

    fn claims() -> AccessClaims {
        AccessClaims::new(
            Uuid::new_v4(),
            UserRole::Staff,
            Uuid::new_v4(),
            Duration::hours(1),
        )
    }

    #[test]
    fn test_mint_verify_round_trip() {
        let codec = codec();
        let claims = claims();

        let token = codec.mint(&claims).unwrap();
        let verified = codec.verify(&token).unwrap();

        assert_eq!(verified, claims);
    }

    #[test]
    fn test_token_shape() {
        let token = codec().mint(&claims()).unwrap();
        let parts: Vec<&str> = token.split('.').collect();
        assert_eq!(parts.len(), 3);
        // Unpadded base64url throughout
        assert!(!token.contains('='));
        assert!(!token.contains('+'));
        assert!(!token.contains('/'));
    }

    #[test]
    fn test_tampered_signature_rejected() {
        let codec = codec();
        let token = codec.mint(&claims()).unwrap();

        // Flip the last character of the signature segment
        let mut chars: Vec<char> = token.chars().collect();
        let last = *chars.last().unwrap();
        *chars.last_mut().unwrap() = if last == 'A' { 'B' } else { 'A' };
        let tampered: String = chars.into_iter().collect();

        assert!(matches!(
            codec.verify(&tampered),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let codec = codec();
        let token = codec.mint(&claims()).unwrap();
        let parts: Vec<&str> = token.split('.').collect();

        let other = AccessClaims::new(
            Uuid::new_v4(),
            UserRole::Owner,
            Uuid::new_v4(),
            Duration::hours(1),
        );
        let forged_payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&other).unwrap());
        let forged = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);

        assert!(matches!(codec.verify(&forged), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_expired_token_with_valid_signature() {
        let codec = codec();
        let mut claims = claims();
        claims.iat = Utc::now().timestamp() - 7200;
        claims.exp = Utc::now().timestamp() - 3600;

        let token = codec.mint(&claims).unwrap();
        assert!(matches!(codec.verify(&token), Err(AuthError::TokenExpired)));
    }

    #[test]
    fn test_wrong_segment_count_rejected() {
        let codec = codec();
        assert!(matches!(
            codec.verify("not-a-token"),
            Err(AuthError::InvalidToken)
        ));
        assert!(matches!(
            codec.verify("a.b"),
            Err(AuthError::InvalidToken)
        ));
        assert!(matches!(
            codec.verify("a.b.c.d"),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = codec().mint(&claims()).unwrap();
        let other = TokenCodec::new("a-different-secret");
        assert!(matches!(other.verify(&token), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_decoder_tolerates_padded_input() {
        let codec = codec();
        let claims = claims();
        let token = codec.mint(&claims).unwrap();
        let parts: Vec<&str> = token.split('.').collect();

        // Re-pad the payload segment; signature is computed over the unpadded
        // form, so only the decode path is exercised here.
        let padded = format!("{}{}", parts[1], "=".repeat((4 - parts[1].len() % 4) % 4));
        let decoded = decode_b64url(&padded).unwrap();
        let reparsed: AccessClaims = serde_json::from_slice(&decoded).unwrap();
        assert_eq!(reparsed, claims);
    }

    #[test]
    fn test_claims_invariants() {
        let claims = claims();
        assert!(claims.exp > claims.iat);
        assert!(claims.remaining_ttl_seconds() > 0);
        assert!(claims.remaining_ttl_seconds() <= 3600);

        let other = AccessClaims::new(
            claims.sub,
            claims.role,
            claims.venue_id,
            Duration::hours(1),
        );
        assert_ne!(claims.jti, other.jti);
    }

    #[test]
    fn test_venue_id_wire_name() {
        let claims = claims();
        let json = serde_json::to_string(&claims).unwrap();
        assert!(json.contains("\"venueID\""));
    }
}
