use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{Capability, Identity, MembershipTier, PageAccess, Partition};

/// Session token claims.
///
/// Role, membership and page access are a snapshot taken at issuance for the
/// client's convenience. Authorization never trusts them: the gate only uses
/// `sub` and `partition` to locate the live record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject identifier within `partition`.
    pub sub: Uuid,

    pub partition: Partition,

    pub username: String,

    pub role: String,

    /// Only present for core identities.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub membership: Option<MembershipTier>,

    #[serde(default)]
    pub page_access: PageAccess,

    /// Issued-at, unix seconds.
    pub iat: i64,

    /// Expiry, unix seconds.
    pub exp: i64,
}

impl SessionClaims {
    /// Snapshot an identity into claims valid for `ttl` from `now`.
    pub fn for_identity(identity: &Identity, now: DateTime<Utc>, ttl: Duration) -> Self {
        let membership = identity.as_core().map(|core| core.membership);
        Self {
            sub: identity.subject(),
            partition: identity.partition(),
            username: identity.username().to_string(),
            role: identity.role_name().to_string(),
            membership,
            page_access: identity.page_access().clone(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        }
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid token time window (expires_at <= issued_at)")]
    InvalidTimeWindow,
}

/// Deterministically validate the time window of already-decoded claims.
///
/// Signature verification happens in [`crate::token`]; this only checks time.
pub fn validate_claims(claims: &SessionClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    if claims.exp <= claims.iat {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    let now = now.timestamp();
    if now < claims.iat {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.exp {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use bizops_core::UserId;

    use super::*;
    use crate::{CoreIdentity, CoreRole};

    fn claims_at(now: DateTime<Utc>) -> SessionClaims {
        let identity = Identity::Core(CoreIdentity {
            id: UserId::new(),
            username: "alice".to_string(),
            role: CoreRole::Standard,
            membership: MembershipTier::Platinum,
            page_access: PageAccess::parse(["stocks"]).unwrap(),
        });
        SessionClaims::for_identity(&identity, now, Duration::days(5))
    }

    #[test]
    fn valid_inside_window() {
        let now = Utc::now();
        let claims = claims_at(now);
        assert_eq!(validate_claims(&claims, now + Duration::days(4)), Ok(()));
    }

    #[test]
    fn expired_at_exact_expiry_instant() {
        let now = Utc::now();
        let claims = claims_at(now);
        let at_expiry = DateTime::from_timestamp(claims.exp, 0).unwrap();
        assert_eq!(validate_claims(&claims, at_expiry), Err(TokenValidationError::Expired));
    }

    #[test]
    fn future_issued_at_is_rejected() {
        let now = Utc::now();
        let claims = claims_at(now + Duration::hours(1));
        assert_eq!(validate_claims(&claims, now), Err(TokenValidationError::NotYetValid));
    }

    #[test]
    fn inverted_window_is_rejected() {
        let mut claims = claims_at(Utc::now());
        claims.exp = claims.iat;
        assert_eq!(
            validate_claims(&claims, Utc::now()),
            Err(TokenValidationError::InvalidTimeWindow)
        );
    }

    #[test]
    fn core_claims_carry_membership_snapshot() {
        let claims = claims_at(Utc::now());
        assert_eq!(claims.partition, Partition::Core);
        assert_eq!(claims.role, "standard");
        assert_eq!(claims.membership, Some(MembershipTier::Platinum));
        assert_eq!(claims.exp - claims.iat, 5 * 24 * 60 * 60);
    }
}
