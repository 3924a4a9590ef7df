//! HS256 session token codec.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Serialize;

use crate::{AuthError, Identity, SessionClaims, TokenValidationError, validate_claims};

/// Default session lifetime (5 days).
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 120;

/// A freshly minted bearer token.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Signs and verifies session tokens with a process-wide secret.
///
/// Expiry is checked against a caller-supplied clock rather than the library's
/// internal one, so every time-dependent path is testable.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl core::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenCodec").field("ttl", &self.ttl).finish_non_exhaustive()
    }
}

impl TokenCodec {
    pub fn hs256(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.required_spec_claims = HashSet::new();
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    pub fn with_default_ttl(secret: &[u8]) -> Self {
        Self::hs256(secret, Duration::hours(DEFAULT_TOKEN_TTL_HOURS))
    }

    pub fn issue(&self, identity: &Identity, now: DateTime<Utc>) -> Result<IssuedToken, AuthError> {
        let claims = SessionClaims::for_identity(identity, now, self.ttl);
        let expires_at = claims
            .expires_at()
            .ok_or_else(|| AuthError::internal("token expiry out of range"))?;

        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::internal(format!("token signing failed: {e}")))?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Verify signature and structure, then the time window at `now`.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, AuthError> {
        let data = jsonwebtoken::decode::<SessionClaims>(token, &self.decoding, &self.validation)
            .map_err(|e| {
                tracing::debug!(error = %e, "token rejected");
                AuthError::InvalidToken
            })?;

        match validate_claims(&data.claims, now) {
            Ok(()) => Ok(data.claims),
            Err(TokenValidationError::Expired) => Err(AuthError::TokenExpired),
            Err(e) => {
                tracing::debug!(error = %e, "token time window rejected");
                Err(AuthError::InvalidToken)
            }
        }
    }
}
