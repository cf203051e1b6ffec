//! Password hashing and policy.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

use crate::error::{PlatformError, Result};

const MIN_PASSWORD_LENGTH: usize = 12;

/// Argon2id password hashing with default parameters.
#[derive(Default)]
pub struct PasswordService {
    argon2: Argon2<'static>,
}

impl PasswordService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hash_password(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| PlatformError::internal(format!("Password hashing failed: {}", e)))?;
        Ok(hash.to_string())
    }

    /// A malformed stored hash verifies as false rather than erroring, so a
    /// corrupted row cannot be told apart from a wrong password by a caller.
    pub fn verify_password(&self, password: &str, hash: &str) -> bool {
        match PasswordHash::new(hash) {
            Ok(parsed) => self
                .argon2
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }
}

/// Registration password policy: at least 12 characters with upper, lower,
/// digit and special characters.
pub fn validate_password_strength(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(PlatformError::validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(PlatformError::validation(
            "Password must contain an uppercase letter",
        ));
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(PlatformError::validation(
            "Password must contain a lowercase letter",
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(PlatformError::validation("Password must contain a digit"));
    }
    if password.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(PlatformError::validation(
            "Password must contain a special character",
        ));
    }
    Ok(())
}
