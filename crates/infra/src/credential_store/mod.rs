//! Credential storage for both identity partitions.
//!
//! The store is injected (`Arc<dyn CredentialStore>`) into the issuer and the
//! access gate; nothing resolves it by name at call time.

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryCredentialStore;
pub use postgres::PostgresCredentialStore;

use bizops_auth::{AccessUpdate, NewServiceUser, NewUser, ServiceUserRecord, UserRecord};
use bizops_core::{ServiceUserId, UserId};

/// Credential store error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// A unique identity field (username, email, employee id) is taken.
    #[error("duplicate identity: {0}")]
    Duplicate(String),
    #[error("record not found")]
    NotFound,
    /// The backend could not be reached; callers fail closed.
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Persistence for core users and service users.
///
/// Two logically separate partitions; ids never cross between them.
#[async_trait::async_trait]
pub trait CredentialStore: Send + Sync {
    /// Insert a core user. Fails with `Duplicate` if the username or the
    /// (case-insensitive) email already exists; exactly one record survives.
    async fn create_user(&self, user: NewUser) -> Result<UserRecord, StoreError>;

    /// Look up a core user by username or email.
    async fn find_user_by_login(&self, identifier: &str) -> Result<Option<UserRecord>, StoreError>;

    async fn find_user_by_id(&self, id: UserId) -> Result<Option<UserRecord>, StoreError>;

    /// Apply a role / membership / page-access change.
    async fn update_user_access(&self, id: UserId, update: AccessUpdate) -> Result<UserRecord, StoreError>;

    /// All core users, oldest first.
    async fn list_users(&self) -> Result<Vec<UserRecord>, StoreError>;

    /// Insert a service user. Fails with `Duplicate` on a taken employee id.
    async fn create_service_user(&self, user: NewServiceUser) -> Result<ServiceUserRecord, StoreError>;

    async fn find_service_user_by_employee_id(
        &self,
        employee_id: &str,
    ) -> Result<Option<ServiceUserRecord>, StoreError>;

    async fn find_service_user_by_id(&self, id: ServiceUserId) -> Result<Option<ServiceUserRecord>, StoreError>;
}
