//! Administrative operations on credentials: role changes, membership,
//! page-access grants, staff enrollment and superadmin bootstrap.
//!
//! Every operation takes the acting identity explicitly and checks it before
//! touching the store.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use bizops_auth::{
    AccessUpdate, AuthError, CoreIdentity, CoreRole, MembershipTier, NewServiceUser, NewUser,
    PageAccess, PasswordPolicy, ServiceRole, ServiceUserRecord, UserRecord, authorize_access_change,
    authorize_page_grant, authorize_role_change,
};
use bizops_core::{DomainError, UserId};

use crate::credential_store::{CredentialStore, StoreError};
use crate::deadline::{DEFAULT_STORE_TIMEOUT, bounded};
use crate::issuer::hash_blocking;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdminError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("user not found")]
    NotFound,
}

/// Staff enrollment input.
#[derive(Debug, Clone, Deserialize)]
pub struct EnrollStaff {
    pub employee_id: String,
    pub display_name: String,
    pub department: String,
    #[serde(default)]
    pub role: ServiceRole,
    #[serde(default)]
    pub scope: Vec<String>,
    pub secret: String,
}

#[derive(Clone)]
pub struct AccessAdmin {
    store: Arc<dyn CredentialStore>,
    policy: PasswordPolicy,
    store_timeout: Duration,
}

impl AccessAdmin {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self {
            store,
            policy: PasswordPolicy::default(),
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    fn require_admin(actor: &CoreIdentity) -> Result<(), AdminError> {
        if actor.role >= CoreRole::Admin {
            Ok(())
        } else {
            Err(DomainError::Unauthorized.into())
        }
    }

    async fn load(&self, id: UserId) -> Result<UserRecord, AdminError> {
        bounded("find_user_by_id", self.store_timeout, self.store.find_user_by_id(id))
            .await?
            .ok_or(AdminError::NotFound)
    }

    async fn update(&self, id: UserId, update: AccessUpdate) -> Result<UserRecord, AdminError> {
        bounded("update_user_access", self.store_timeout, async {
            self.store.update_user_access(id, update).await.map(Some).or_else(|e| match e {
                StoreError::NotFound => Ok(None),
                other => Err(other),
            })
        })
        .await?
        .ok_or(AdminError::NotFound)
    }

    pub async fn list_users(&self, actor: &CoreIdentity) -> Result<Vec<UserRecord>, AdminError> {
        Self::require_admin(actor)?;
        Ok(bounded("list_users", self.store_timeout, self.store.list_users()).await?)
    }

    pub async fn change_role(
        &self,
        actor: &CoreIdentity,
        target: UserId,
        new_role: CoreRole,
    ) -> Result<UserRecord, AdminError> {
        let record = self.load(target).await?;
        authorize_role_change(actor, &record, new_role)?;

        // Back to pending means back to no page access.
        let mut update = AccessUpdate::role(new_role);
        if new_role == CoreRole::Pending {
            update.page_access = Some(PageAccess::none());
        }
        let updated = self.update(target, update).await?;
        tracing::info!(
            actor = %actor.id,
            target = %target,
            from = %record.role,
            to = %new_role,
            "role changed"
        );
        Ok(updated)
    }

    pub async fn set_membership(
        &self,
        actor: &CoreIdentity,
        target: UserId,
        membership: MembershipTier,
    ) -> Result<UserRecord, AdminError> {
        let record = self.load(target).await?;
        authorize_access_change(actor, &record)?;

        let updated = self.update(target, AccessUpdate::membership(membership)).await?;
        tracing::info!(actor = %actor.id, target = %target, %membership, "membership changed");
        Ok(updated)
    }

    pub async fn set_page_access(
        &self,
        actor: &CoreIdentity,
        target: UserId,
        pages: PageAccess,
    ) -> Result<UserRecord, AdminError> {
        let record = self.load(target).await?;
        authorize_page_grant(actor, &record, &pages)?;

        let granted = pages.to_strings();
        let updated = self.update(target, AccessUpdate::page_access(pages)).await?;
        tracing::info!(actor = %actor.id, target = %target, pages = ?granted, "page access replaced");
        Ok(updated)
    }

    /// Create a service user with its staff profile. Admin-only.
    pub async fn enroll_staff(
        &self,
        actor: &CoreIdentity,
        input: EnrollStaff,
        now: DateTime<Utc>,
    ) -> Result<ServiceUserRecord, AdminError> {
        Self::require_admin(actor)?;
        self.policy.check(&input.secret)?;
        let scope = PageAccess::parse(&input.scope)?;

        let hash = hash_blocking(input.secret).await?;
        let new_staff = NewServiceUser::enroll(
            &input.employee_id,
            &input.display_name,
            &input.department,
            input.role,
            scope,
            hash,
            now,
        )?;

        let record = bounded(
            "create_service_user",
            self.store_timeout,
            self.store.create_service_user(new_staff),
        )
        .await?;
        tracing::info!(actor = %actor.id, service_user_id = %record.id, employee_id = %record.employee_id, "staff enrolled");
        Ok(record)
    }

    /// Ensure a superadmin with full page access exists.
    ///
    /// Without one nobody could ever approve a pending registration. Idempotent
    /// for an existing superadmin with that username; any other existing
    /// account under that name is an error so startup cannot continue without
    /// a superadmin.
    pub async fn bootstrap_superadmin(
        &self,
        username: &str,
        email: &str,
        secret: &str,
        now: DateTime<Utc>,
    ) -> Result<UserRecord, AdminError> {
        let existing = bounded(
            "find_user_by_login",
            self.store_timeout,
            self.store.find_user_by_login(username),
        )
        .await?;
        if let Some(existing) = existing {
            if existing.role != CoreRole::Superadmin {
                tracing::error!(user_id = %existing.id, role = %existing.role, "bootstrap username taken by a non-superadmin");
                return Err(DomainError::invariant(format!(
                    "bootstrap user '{}' exists with role '{}'",
                    existing.username, existing.role
                ))
                .into());
            }
            tracing::info!(user_id = %existing.id, "bootstrap superadmin already present");
            return Ok(existing);
        }

        self.policy.check(secret)?;
        let hash = hash_blocking(secret.to_string()).await?;
        let mut new_user = NewUser::registration(username, email, hash, now)?;
        new_user.role = CoreRole::Superadmin;
        new_user.page_access = PageAccess::all();

        let record = bounded("create_user", self.store_timeout, self.store.create_user(new_user)).await?;
        tracing::warn!(user_id = %record.id, username = %record.username, "bootstrap superadmin created");
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential_store::InMemoryCredentialStore;

    async fn seeded() -> (AccessAdmin, UserRecord) {
        let admin = AccessAdmin::new(Arc::new(InMemoryCredentialStore::new()));
        let root = admin
            .bootstrap_superadmin("root", "root@example.com", "rootsecret1", Utc::now())
            .await
            .unwrap();
        (admin, root)
    }

    async fn register(admin: &AccessAdmin, username: &str) -> UserRecord {
        let hash = hash_blocking("longsecret1".to_string()).await.unwrap();
        let new_user = NewUser::registration(username, &format!("{username}@example.com"), hash, Utc::now()).unwrap();
        admin.store.create_user(new_user).await.unwrap()
    }

    #[tokio::test]
    async fn bootstrap_is_idempotent_and_fully_privileged() {
        let (admin, root) = seeded().await;
        assert_eq!(root.role, CoreRole::Superadmin);
        assert!(root.page_access.allows(&bizops_auth::PageSlug::parse("anything").unwrap()));

        let again = admin
            .bootstrap_superadmin("root", "root@example.com", "rootsecret1", Utc::now())
            .await
            .unwrap();
        assert_eq!(again.id, root.id);
        assert_eq!(admin.store.list_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn promotion_chain() {
        let (admin, root) = seeded().await;
        let root = root.identity();
        let bob = register(&admin, "bob").await;

        let bob = admin.change_role(&root, bob.id, CoreRole::Standard).await.unwrap();
        let bob = admin.change_role(&root, bob.id, CoreRole::Admin).await.unwrap();
        assert_eq!(bob.role, CoreRole::Admin);

        let carol = register(&admin, "carol").await;
        let carol = admin.change_role(&bob.identity(), carol.id, CoreRole::Standard).await.unwrap();
        let carol = admin.change_role(&bob.identity(), carol.id, CoreRole::Admin).await.unwrap();
        assert_eq!(carol.role, CoreRole::Admin);

        // Peers and superadmin stay out of an admin's reach.
        let err = admin
            .change_role(&bob.identity(), carol.id, CoreRole::Standard)
            .await
            .unwrap_err();
        assert_eq!(err, AdminError::Domain(DomainError::Unauthorized));

        let dave = register(&admin, "dave").await;
        let err = admin
            .change_role(&bob.identity(), dave.id, CoreRole::Superadmin)
            .await
            .unwrap_err();
        assert_eq!(err, AdminError::Domain(DomainError::Unauthorized));
    }

    #[tokio::test]
    async fn pending_users_hold_no_pages() {
        let (admin, root) = seeded().await;
        let root = root.identity();
        let erin = register(&admin, "erin").await;
        let laundry = PageAccess::parse(["laundry"]).unwrap();

        let err = admin.set_page_access(&root, erin.id, laundry.clone()).await.unwrap_err();
        assert!(matches!(err, AdminError::Domain(DomainError::InvariantViolation(_))));

        admin.change_role(&root, erin.id, CoreRole::Standard).await.unwrap();
        let erin = admin.set_page_access(&root, erin.id, laundry).await.unwrap();
        assert!(!erin.page_access.is_empty());

        let erin = admin.change_role(&root, erin.id, CoreRole::Pending).await.unwrap();
        assert!(erin.page_access.is_empty());
    }

    #[tokio::test]
    async fn bootstrap_refuses_squatted_username() {
        let admin = AccessAdmin::new(Arc::new(InMemoryCredentialStore::new()));
        let squatter = register(&admin, "root").await;
        assert_eq!(squatter.role, CoreRole::Pending);

        let err = admin
            .bootstrap_superadmin("root", "root@example.com", "rootsecret1", Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, AdminError::Domain(DomainError::InvariantViolation(_))));
        assert_eq!(admin.store.list_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn missing_target_is_not_found() {
        let (admin, root) = seeded().await;
        let err = admin
            .change_role(&root.identity(), UserId::new(), CoreRole::Standard)
            .await
            .unwrap_err();
        assert_eq!(err, AdminError::NotFound);
    }

    #[tokio::test]
    async fn page_access_and_membership_updates() {
        let (admin, root) = seeded().await;
        let dave = register(&admin, "dave").await;
        admin.change_role(&root.identity(), dave.id, CoreRole::Standard).await.unwrap();

        let dave = admin
            .set_page_access(&root.identity(), dave.id, PageAccess::parse(["stocks"]).unwrap())
            .await
            .unwrap();
        let dave = admin
            .set_membership(&root.identity(), dave.id, MembershipTier::Platinum)
            .await
            .unwrap();

        assert_eq!(dave.page_access.to_strings(), vec!["stocks"]);
        assert_eq!(dave.membership, MembershipTier::Platinum);
    }

    #[tokio::test]
    async fn staff_enrollment_requires_admin() {
        let (admin, root) = seeded().await;
        let eve = register(&admin, "eve").await;
        let input = EnrollStaff {
            employee_id: "E9".to_string(),
            display_name: "Eve".to_string(),
            department: "laundry".to_string(),
            role: ServiceRole::Standard,
            scope: vec!["laundry".to_string()],
            secret: "staffsecret1".to_string(),
        };

        let err = admin.enroll_staff(&eve.identity(), input.clone(), Utc::now()).await.unwrap_err();
        assert_eq!(err, AdminError::Domain(DomainError::Unauthorized));

        let staff = admin.enroll_staff(&root.identity(), input.clone(), Utc::now()).await.unwrap();
        assert_eq!(staff.employee_id, "E9");

        let dup = admin.enroll_staff(&root.identity(), input, Utc::now()).await.unwrap_err();
        assert_eq!(dup, AdminError::Auth(AuthError::DuplicateIdentity));
    }
}
