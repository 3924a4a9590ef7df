use std::collections::HashMap;
use std::sync::RwLock;

use bizops_auth::{
    AccessUpdate, NewServiceUser, NewUser, ServiceUserRecord, UserRecord, normalize_employee_id,
};
use bizops_core::{ServiceUserId, UserId};

use super::{CredentialStore, StoreError};

/// In-memory credential store for tests/dev.
///
/// Uniqueness checks and inserts happen under one write lock, so concurrent
/// registrations of the same identity leave exactly one record.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    users: RwLock<HashMap<UserId, UserRecord>>,
    service_users: RwLock<HashMap<ServiceUserId, ServiceUserRecord>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Backend("lock poisoned".to_string())
}

#[async_trait::async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn create_user(&self, user: NewUser) -> Result<UserRecord, StoreError> {
        let mut users = self.users.write().map_err(poisoned)?;

        let email = user.email.to_lowercase();
        if users.values().any(|u| u.username == user.username) {
            return Err(StoreError::Duplicate(format!("username '{}'", user.username)));
        }
        if users.values().any(|u| u.email == email) {
            return Err(StoreError::Duplicate(format!("email '{email}'")));
        }

        let record = user.into_record(UserId::new());
        users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_user_by_login(&self, identifier: &str) -> Result<Option<UserRecord>, StoreError> {
        let users = self.users.read().map_err(poisoned)?;
        let identifier = identifier.trim();
        let lowered = identifier.to_lowercase();
        Ok(users
            .values()
            .find(|u| u.username == identifier || u.email == lowered)
            .cloned())
    }

    async fn find_user_by_id(&self, id: UserId) -> Result<Option<UserRecord>, StoreError> {
        let users = self.users.read().map_err(poisoned)?;
        Ok(users.get(&id).cloned())
    }

    async fn update_user_access(&self, id: UserId, update: AccessUpdate) -> Result<UserRecord, StoreError> {
        let mut users = self.users.write().map_err(poisoned)?;
        let user = users.get_mut(&id).ok_or(StoreError::NotFound)?;
        user.apply(&update);
        Ok(user.clone())
    }

    async fn list_users(&self) -> Result<Vec<UserRecord>, StoreError> {
        let users = self.users.read().map_err(poisoned)?;
        let mut all: Vec<UserRecord> = users.values().cloned().collect();
        all.sort_by_key(|u| (u.created_at, u.id));
        Ok(all)
    }

    async fn create_service_user(&self, user: NewServiceUser) -> Result<ServiceUserRecord, StoreError> {
        let mut service_users = self.service_users.write().map_err(poisoned)?;
        if service_users.values().any(|u| u.employee_id == user.employee_id) {
            return Err(StoreError::Duplicate(format!("employee id '{}'", user.employee_id)));
        }

        let record = user.into_record(ServiceUserId::new());
        service_users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_service_user_by_employee_id(
        &self,
        employee_id: &str,
    ) -> Result<Option<ServiceUserRecord>, StoreError> {
        let Ok(employee_id) = normalize_employee_id(employee_id) else {
            return Ok(None);
        };
        let service_users = self.service_users.read().map_err(poisoned)?;
        Ok(service_users.values().find(|u| u.employee_id == employee_id).cloned())
    }

    async fn find_service_user_by_id(&self, id: ServiceUserId) -> Result<Option<ServiceUserRecord>, StoreError> {
        let service_users = self.service_users.read().map_err(poisoned)?;
        Ok(service_users.get(&id).cloned())
    }
}
