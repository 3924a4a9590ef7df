//! Password hashing (argon2id) and the minimum password policy.

use std::sync::LazyLock;

use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use password_hash::{PasswordHash, SaltString};
use serde::{Deserialize, Serialize};

use bizops_core::DomainError;

use crate::AuthError;

/// Stored password hash in PHC string format. Never printed.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HashedSecret(String);

impl HashedSecret {
    pub fn from_phc(phc: impl Into<String>) -> Self {
        Self(phc.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Debug for HashedSecret {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("HashedSecret(<redacted>)")
    }
}

/// Hash a plaintext secret with argon2id and a fresh random salt.
pub fn hash_secret(secret: &str) -> Result<HashedSecret, AuthError> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes).map_err(|e| AuthError::internal(e.to_string()))?;
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| AuthError::internal(e.to_string()))?;

    let phc = Argon2::default()
        .hash_password(secret.as_bytes(), &salt)
        .map_err(|e| AuthError::internal(e.to_string()))?
        .to_string();
    Ok(HashedSecret(phc))
}

/// Constant-time verification of `secret` against a stored hash.
pub fn verify_secret(hash: &HashedSecret, secret: &str) -> bool {
    match PasswordHash::new(hash.as_str()) {
        Ok(parsed) => Argon2::default().verify_password(secret.as_bytes(), &parsed).is_ok(),
        Err(e) => {
            tracing::warn!(error = %e, "stored password hash is not a valid PHC string");
            false
        }
    }
}

static DUMMY_HASH: LazyLock<Option<HashedSecret>> =
    LazyLock::new(|| hash_secret("bizops-timing-equalizer").ok());

/// Spend the same work as a real verification when the identity is unknown.
pub fn burn_verification(secret: &str) {
    if let Some(hash) = DUMMY_HASH.as_ref() {
        let _ = verify_secret(hash, secret);
    }
}

/// Minimum password policy applied before hashing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordPolicy {
    pub min_len: usize,
    pub max_len: usize,
    pub require_letter: bool,
    pub require_digit: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_len: 8,
            max_len: 128,
            require_letter: true,
            require_digit: true,
        }
    }
}

impl PasswordPolicy {
    pub fn check(&self, secret: &str) -> Result<(), DomainError> {
        let len = secret.chars().count();
        if len < self.min_len {
            return Err(DomainError::validation(format!(
                "password must be at least {} characters",
                self.min_len
            )));
        }
        if len > self.max_len {
            return Err(DomainError::validation(format!(
                "password must be at most {} characters",
                self.max_len
            )));
        }
        if self.require_letter && !secret.chars().any(char::is_alphabetic) {
            return Err(DomainError::validation("password must contain a letter"));
        }
        if self.require_digit && !secret.chars().any(|c| c.is_ascii_digit()) {
            return Err(DomainError::validation("password must contain a digit"));
        }
        Ok(())
    }
}
