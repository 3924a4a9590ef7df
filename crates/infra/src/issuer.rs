//! Token issuer: registration and login for both partitions.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use bizops_auth::{
    AuthError, CoreRole, HashedSecret, Identity, IssuedToken, NewUser, PasswordPolicy, TokenCodec,
    UserRecord, burn_verification, hash_secret, normalize_email, normalize_username, verify_secret,
};

use crate::credential_store::CredentialStore;
use crate::deadline::{DEFAULT_STORE_TIMEOUT, bounded};

/// Registration input.
#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub secret: String,
}

/// Successful login: the token plus the identity it was minted for.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub token: IssuedToken,
    pub identity: Identity,
}

/// Authenticates login attempts and mints session tokens.
///
/// There is no lockout or attempt counter; brute-force protection is expected
/// from an outer layer.
#[derive(Clone)]
pub struct TokenIssuer {
    store: Arc<dyn CredentialStore>,
    codec: TokenCodec,
    policy: PasswordPolicy,
    store_timeout: Duration,
}

impl TokenIssuer {
    pub fn new(store: Arc<dyn CredentialStore>, codec: TokenCodec) -> Self {
        Self {
            store,
            codec,
            policy: PasswordPolicy::default(),
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    /// Register a core user. The account starts `pending` and cannot log in
    /// until an admin promotes it.
    pub async fn register(&self, registration: Registration, now: DateTime<Utc>) -> Result<UserRecord, AuthError> {
        self.policy
            .check(&registration.secret)
            .map_err(|e| AuthError::Validation(e.to_string()))?;
        let username = normalize_username(&registration.username).map_err(|e| AuthError::Validation(e.to_string()))?;
        let email = normalize_email(&registration.email).map_err(|e| AuthError::Validation(e.to_string()))?;

        let hash = hash_blocking(registration.secret).await?;
        let new_user = NewUser::registration(&username, &email, hash, now)
            .map_err(|e| AuthError::Validation(e.to_string()))?;

        let record = bounded("create_user", self.store_timeout, self.store.create_user(new_user)).await?;
        tracing::info!(user_id = %record.id, username = %record.username, "user registered (pending)");
        Ok(record)
    }

    /// Authenticate a core user by username or email.
    ///
    /// Unknown identifier and wrong secret are indistinguishable
    /// (`InvalidCredentials`, same hashing work). Pending status is only
    /// revealed to a caller who knows the secret.
    pub async fn login(&self, identifier: &str, secret: &str, now: DateTime<Utc>) -> Result<LoginOutcome, AuthError> {
        let record = bounded(
            "find_user_by_login",
            self.store_timeout,
            self.store.find_user_by_login(identifier),
        )
        .await?;

        let verified = verify_blocking(record.as_ref().map(|r| r.password_hash.clone()), secret).await?;
        let record = match record {
            Some(record) if verified => record,
            _ => {
                tracing::warn!(partition = "core", "login rejected: invalid credentials");
                return Err(AuthError::InvalidCredentials);
            }
        };

        if record.role == CoreRole::Pending {
            tracing::info!(user_id = %record.id, "login blocked: account pending");
            return Err(AuthError::AccountPending);
        }

        let identity = Identity::Core(record.identity());
        let token = self.codec.issue(&identity, now)?;
        tracing::info!(user_id = %record.id, role = %record.role, "login succeeded");
        Ok(LoginOutcome { token, identity })
    }

    /// Authenticate a service (staff) user by employee id.
    pub async fn service_login(
        &self,
        employee_id: &str,
        secret: &str,
        now: DateTime<Utc>,
    ) -> Result<LoginOutcome, AuthError> {
        let record = bounded(
            "find_service_user_by_employee_id",
            self.store_timeout,
            self.store.find_service_user_by_employee_id(employee_id),
        )
        .await?;

        let verified = verify_blocking(record.as_ref().map(|r| r.password_hash.clone()), secret).await?;
        let record = match record {
            Some(record) if verified => record,
            _ => {
                tracing::warn!(partition = "service", "login rejected: invalid credentials");
                return Err(AuthError::InvalidCredentials);
            }
        };

        let identity = Identity::Service(record.identity());
        let token = self.codec.issue(&identity, now)?;
        tracing::info!(service_user_id = %record.id, role = %record.role, "service login succeeded");
        Ok(LoginOutcome { token, identity })
    }
}

/// Argon2 is CPU-bound; keep it off the async workers.
pub(crate) async fn hash_blocking(secret: String) -> Result<HashedSecret, AuthError> {
    tokio::task::spawn_blocking(move || hash_secret(&secret))
        .await
        .map_err(|e| AuthError::internal(format!("hashing task failed: {e}")))?
}

async fn verify_blocking(hash: Option<HashedSecret>, secret: &str) -> Result<bool, AuthError> {
    let secret = secret.to_string();
    tokio::task::spawn_blocking(move || match hash {
        Some(hash) => verify_secret(&hash, &secret),
        None => {
            burn_verification(&secret);
            false
        }
    })
    .await
    .map_err(|e| AuthError::internal(format!("verification task failed: {e}")))
}

#[cfg(test)]
mod tests {
    use bizops_auth::{AccessUpdate, MembershipTier};

    use super::*;
    use crate::credential_store::InMemoryCredentialStore;

    fn issuer() -> (Arc<InMemoryCredentialStore>, TokenIssuer) {
        let store = Arc::new(InMemoryCredentialStore::new());
        let issuer = TokenIssuer::new(store.clone(), TokenCodec::with_default_ttl(b"test-secret"));
        (store, issuer)
    }

    fn alice() -> Registration {
        Registration {
            username: "alice".to_string(),
            email: "alice@x.com".to_string(),
            secret: "longsecret1".to_string(),
        }
    }

    #[tokio::test]
    async fn registered_user_is_pending_and_cannot_log_in() {
        let (_store, issuer) = issuer();
        let record = issuer.register(alice(), Utc::now()).await.unwrap();
        assert_eq!(record.role, CoreRole::Pending);

        let err = issuer.login("alice", "longsecret1", Utc::now()).await.unwrap_err();
        assert_eq!(err, AuthError::AccountPending);
    }

    #[tokio::test]
    async fn promoted_user_logs_in_by_username_or_email() {
        let (store, issuer) = issuer();
        let record = issuer.register(alice(), Utc::now()).await.unwrap();
        store
            .update_user_access(record.id, AccessUpdate::role(CoreRole::Standard))
            .await
            .unwrap();

        let by_name = issuer.login("alice", "longsecret1", Utc::now()).await.unwrap();
        let by_email = issuer.login("ALICE@x.com", "longsecret1", Utc::now()).await.unwrap();

        let core = by_name.identity.as_core().unwrap();
        assert_eq!(core.id, record.id);
        assert_eq!(core.role, CoreRole::Standard);
        assert_eq!(core.membership, MembershipTier::None);
        assert_eq!(by_email.identity, by_name.identity);
    }

    #[tokio::test]
    async fn unknown_user_and_wrong_secret_are_indistinguishable() {
        let (store, issuer) = issuer();
        let record = issuer.register(alice(), Utc::now()).await.unwrap();
        store
            .update_user_access(record.id, AccessUpdate::role(CoreRole::Standard))
            .await
            .unwrap();

        let unknown = issuer.login("mallory", "longsecret1", Utc::now()).await.unwrap_err();
        let wrong = issuer.login("alice", "wrongsecret1", Utc::now()).await.unwrap_err();
        assert_eq!(unknown, AuthError::InvalidCredentials);
        assert_eq!(wrong, unknown);
    }

    #[tokio::test]
    async fn pending_with_wrong_secret_does_not_reveal_pending() {
        let (_store, issuer) = issuer();
        issuer.register(alice(), Utc::now()).await.unwrap();

        let err = issuer.login("alice", "wrongsecret1", Utc::now()).await.unwrap_err();
        assert_eq!(err, AuthError::InvalidCredentials);
    }

    #[tokio::test]
    async fn duplicate_registration_is_rejected() {
        let (store, issuer) = issuer();
        issuer.register(alice(), Utc::now()).await.unwrap();

        let err = issuer.register(alice(), Utc::now()).await.unwrap_err();
        assert_eq!(err, AuthError::DuplicateIdentity);
        assert_eq!(store.list_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn weak_password_is_rejected_before_hashing() {
        let (store, issuer) = issuer();
        let mut reg = alice();
        reg.secret = "short".to_string();

        let err = issuer.register(reg, Utc::now()).await.unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));
        assert!(store.list_users().await.unwrap().is_empty());
    }
}
