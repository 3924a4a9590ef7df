//! Access gate: verifies a bearer token and resolves the live identity.
//!
//! The token only locates the subject. Role, membership and page access are
//! always re-read from the store, so promotions, demotions and deletions take
//! effect on the next request.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use bizops_auth::{AuthError, Identity, TokenCodec};
use bizops_core::{ServiceUserId, UserId};

use crate::credential_store::CredentialStore;
use crate::deadline::{DEFAULT_STORE_TIMEOUT, bounded};

/// Extract the token from an `Authorization: Bearer <token>` value.
pub fn extract_bearer(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header.ok_or(AuthError::MissingToken)?;
    // Auth scheme names are case-insensitive.
    let (scheme, token) = header.trim().split_once(' ').ok_or(AuthError::MissingToken)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::MissingToken);
    }
    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }
    Ok(token)
}

#[derive(Clone)]
pub struct AccessGate {
    store: Arc<dyn CredentialStore>,
    codec: TokenCodec,
    store_timeout: Duration,
}

impl AccessGate {
    pub fn new(store: Arc<dyn CredentialStore>, codec: TokenCodec) -> Self {
        Self {
            store,
            codec,
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    /// Gate for core-user resources.
    pub async fn authenticate_core(
        &self,
        authorization: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Identity, AuthError> {
        let token = extract_bearer(authorization)?;
        let claims = self.codec.verify(token, now)?;

        let user_id = UserId::from_uuid(claims.sub);
        let record = bounded("find_user_by_id", self.store_timeout, self.store.find_user_by_id(user_id)).await?;

        match record {
            Some(record) => Ok(Identity::Core(record.identity())),
            None => {
                tracing::warn!(subject = %claims.sub, "token subject no longer resolves");
                Err(AuthError::StaleIdentity)
            }
        }
    }

    /// Gate for service-only resources.
    ///
    /// Resolves strictly in the service partition. A valid core token of any
    /// role, superadmin included, fails here with `NotServiceStaff`.
    pub async fn authenticate_service(
        &self,
        authorization: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Identity, AuthError> {
        let token = extract_bearer(authorization)?;
        let claims = self.codec.verify(token, now)?;

        let id = ServiceUserId::from_uuid(claims.sub);
        let record = bounded(
            "find_service_user_by_id",
            self.store_timeout,
            self.store.find_service_user_by_id(id),
        )
        .await?;

        match record {
            Some(record) => Ok(Identity::Service(record.identity())),
            None => {
                tracing::warn!(subject = %claims.sub, partition = %claims.partition, "service gate rejected non-staff identity");
                Err(AuthError::NotServiceStaff)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration as ChronoDuration;

    use bizops_auth::{
        AccessUpdate, CoreRole, NewServiceUser, PageAccess, ServiceRole, UserRecord, hash_secret,
    };

    use super::*;
    use crate::credential_store::{InMemoryCredentialStore, StoreError};
    use crate::issuer::{Registration, TokenIssuer};

    const SECRET: &[u8] = b"gate-secret";

    struct Fixture {
        store: Arc<InMemoryCredentialStore>,
        issuer: TokenIssuer,
        gate: AccessGate,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryCredentialStore::new());
        let codec = TokenCodec::with_default_ttl(SECRET);
        Fixture {
            issuer: TokenIssuer::new(store.clone(), codec.clone()),
            gate: AccessGate::new(store.clone(), codec),
            store,
        }
    }

    async fn core_user(f: &Fixture, username: &str, role: CoreRole) -> UserRecord {
        let record = f
            .issuer
            .register(
                Registration {
                    username: username.to_string(),
                    email: format!("{username}@example.com"),
                    secret: "longsecret1".to_string(),
                },
                Utc::now(),
            )
            .await
            .unwrap();
        f.store.update_user_access(record.id, AccessUpdate::role(role)).await.unwrap()
    }

    fn bearer(token: &str) -> String {
        format!("Bearer {token}")
    }

    #[test]
    fn bearer_extraction() {
        assert_eq!(extract_bearer(None), Err(AuthError::MissingToken));
        assert_eq!(extract_bearer(Some("Basic abc")), Err(AuthError::MissingToken));
        assert_eq!(extract_bearer(Some("Bearer   ")), Err(AuthError::MissingToken));
        assert_eq!(extract_bearer(Some("Bearer abc")), Ok("abc"));
        assert_eq!(extract_bearer(Some("BEARER abc")), Ok("abc"));
        assert_eq!(extract_bearer(Some("bEaReR  abc ")), Ok("abc"));
        assert_eq!(extract_bearer(Some("Bearerabc")), Err(AuthError::MissingToken));
    }

    #[tokio::test]
    async fn login_token_resolves_to_same_identity() {
        let f = fixture();
        core_user(&f, "alice", CoreRole::Standard).await;
        let outcome = f.issuer.login("alice", "longsecret1", Utc::now()).await.unwrap();

        let identity = f
            .gate
            .authenticate_core(Some(&bearer(&outcome.token.token)), Utc::now())
            .await
            .unwrap();
        assert_eq!(identity, outcome.identity);
    }

    #[tokio::test]
    async fn gate_returns_live_role_not_token_snapshot() {
        let f = fixture();
        let alice = core_user(&f, "alice", CoreRole::Standard).await;
        let outcome = f.issuer.login("alice", "longsecret1", Utc::now()).await.unwrap();

        f.store.update_user_access(alice.id, AccessUpdate::role(CoreRole::Admin)).await.unwrap();

        let identity = f
            .gate
            .authenticate_core(Some(&bearer(&outcome.token.token)), Utc::now())
            .await
            .unwrap();
        assert_eq!(identity.as_core().unwrap().role, CoreRole::Admin);
    }

    #[tokio::test]
    async fn expired_token_is_rejected() {
        let f = fixture();
        core_user(&f, "alice", CoreRole::Standard).await;
        let issued_at = Utc::now();
        let outcome = f.issuer.login("alice", "longsecret1", issued_at).await.unwrap();

        let after_expiry = issued_at + ChronoDuration::days(5) + ChronoDuration::seconds(1);
        let err = f
            .gate
            .authenticate_core(Some(&bearer(&outcome.token.token)), after_expiry)
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::TokenExpired);
    }

    #[tokio::test]
    async fn tampered_token_is_invalid() {
        let f = fixture();
        core_user(&f, "alice", CoreRole::Superadmin).await;
        let outcome = f.issuer.login("alice", "longsecret1", Utc::now()).await.unwrap();

        let forged = TokenCodec::with_default_ttl(b"attacker").issue(&outcome.identity, Utc::now()).unwrap();
        let err = f.gate.authenticate_core(Some(&bearer(&forged.token)), Utc::now()).await.unwrap_err();
        assert_eq!(err, AuthError::InvalidToken);

        let mut token = outcome.token.token.clone();
        token.push('x');
        let err = f.gate.authenticate_core(Some(&bearer(&token)), Utc::now()).await.unwrap_err();
        assert_eq!(err, AuthError::InvalidToken);
    }

    #[tokio::test]
    async fn unknown_subject_is_stale() {
        let f = fixture();
        let ghost = bizops_auth::Identity::Core(bizops_auth::CoreIdentity {
            id: UserId::new(),
            username: "ghost".to_string(),
            role: CoreRole::Admin,
            membership: Default::default(),
            page_access: PageAccess::all(),
        });
        let token = TokenCodec::with_default_ttl(SECRET).issue(&ghost, Utc::now()).unwrap();

        let err = f.gate.authenticate_core(Some(&bearer(&token.token)), Utc::now()).await.unwrap_err();
        assert_eq!(err, AuthError::StaleIdentity);
    }

    #[tokio::test]
    async fn service_gate_rejects_every_core_role() {
        let f = fixture();
        for (i, role) in [CoreRole::Standard, CoreRole::Admin, CoreRole::Superadmin].into_iter().enumerate() {
            let username = format!("core{i}");
            core_user(&f, &username, role).await;
            let outcome = f.issuer.login(&username, "longsecret1", Utc::now()).await.unwrap();

            let err = f
                .gate
                .authenticate_service(Some(&bearer(&outcome.token.token)), Utc::now())
                .await
                .unwrap_err();
            assert_eq!(err, AuthError::NotServiceStaff, "role {role} passed the service gate");
        }
    }

    #[tokio::test]
    async fn service_token_passes_service_gate_only() {
        let f = fixture();
        let staff = NewServiceUser::enroll(
            "E1001",
            "Dana",
            "laundry",
            ServiceRole::Standard,
            PageAccess::parse(["laundry"]).unwrap(),
            hash_secret("longsecret1").unwrap(),
            Utc::now(),
        )
        .unwrap();
        f.store.create_service_user(staff).await.unwrap();

        let outcome = f.issuer.service_login("e1001", "longsecret1", Utc::now()).await.unwrap();
        let header = bearer(&outcome.token.token);

        let identity = f.gate.authenticate_service(Some(&header), Utc::now()).await.unwrap();
        assert_eq!(identity.as_service().unwrap().role, ServiceRole::Standard);

        let err = f.gate.authenticate_core(Some(&header), Utc::now()).await.unwrap_err();
        assert_eq!(err, AuthError::StaleIdentity);
    }

    struct UnreachableStore;

    #[async_trait::async_trait]
    impl CredentialStore for UnreachableStore {
        async fn create_user(&self, _: bizops_auth::NewUser) -> Result<UserRecord, StoreError> {
            Err(StoreError::Unavailable("down".into()))
        }
        async fn find_user_by_login(&self, _: &str) -> Result<Option<UserRecord>, StoreError> {
            Err(StoreError::Unavailable("down".into()))
        }
        async fn find_user_by_id(&self, _: UserId) -> Result<Option<UserRecord>, StoreError> {
            Err(StoreError::Unavailable("down".into()))
        }
        async fn update_user_access(&self, _: UserId, _: AccessUpdate) -> Result<UserRecord, StoreError> {
            Err(StoreError::Unavailable("down".into()))
        }
        async fn list_users(&self) -> Result<Vec<UserRecord>, StoreError> {
            Err(StoreError::Unavailable("down".into()))
        }
        async fn create_service_user(
            &self,
            _: NewServiceUser,
        ) -> Result<bizops_auth::ServiceUserRecord, StoreError> {
            Err(StoreError::Unavailable("down".into()))
        }
        async fn find_service_user_by_employee_id(
            &self,
            _: &str,
        ) -> Result<Option<bizops_auth::ServiceUserRecord>, StoreError> {
            Err(StoreError::Unavailable("down".into()))
        }
        async fn find_service_user_by_id(
            &self,
            _: ServiceUserId,
        ) -> Result<Option<bizops_auth::ServiceUserRecord>, StoreError> {
            Err(StoreError::Unavailable("down".into()))
        }
    }

    #[tokio::test]
    async fn unreachable_store_fails_closed() {
        let codec = TokenCodec::with_default_ttl(SECRET);
        let gate = AccessGate::new(Arc::new(UnreachableStore), codec.clone());
        let identity = bizops_auth::Identity::Core(bizops_auth::CoreIdentity {
            id: UserId::new(),
            username: "alice".to_string(),
            role: CoreRole::Superadmin,
            membership: Default::default(),
            page_access: PageAccess::all(),
        });
        let token = codec.issue(&identity, Utc::now()).unwrap();

        let err = gate.authenticate_core(Some(&bearer(&token.token)), Utc::now()).await.unwrap_err();
        assert_eq!(err, AuthError::AuthServiceUnavailable);
    }
}
