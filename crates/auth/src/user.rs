//! Credential records for both partitions and the rules that mutate them.
//!
//! Records are plain data; persistence lives behind `CredentialStore` in
//! `bizops-infra`. The role state machine and registration validation are
//! kept here so they stay pure and testable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bizops_core::{DomainError, ServiceUserId, UserId};

use crate::{
    CoreIdentity, CoreRole, HashedSecret, MembershipTier, PageAccess, ServiceIdentity, ServiceRole,
};

/// Domain for staff placeholder emails. `.invalid` never resolves.
pub const STAFF_EMAIL_DOMAIN: &str = "staff.invalid";

// ─────────────────────────────────────────────────────────────────────────────
// Core users
// ─────────────────────────────────────────────────────────────────────────────

/// A core platform user as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub username: String,
    /// Always stored lowercased.
    pub email: String,
    pub password_hash: HashedSecret,
    pub role: CoreRole,
    pub membership: MembershipTier,
    pub page_access: PageAccess,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    pub fn identity(&self) -> CoreIdentity {
        CoreIdentity {
            id: self.id,
            username: self.username.clone(),
            role: self.role,
            membership: self.membership,
            page_access: self.page_access.clone(),
        }
    }

    pub fn apply(&mut self, update: &AccessUpdate) {
        if let Some(role) = update.role {
            self.role = role;
        }
        if let Some(membership) = update.membership {
            self.membership = membership;
        }
        if let Some(page_access) = &update.page_access {
            self.page_access = page_access.clone();
        }
    }
}

/// Validated input for inserting a new core user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: HashedSecret,
    pub role: CoreRole,
    pub page_access: PageAccess,
    pub created_at: DateTime<Utc>,
}

impl NewUser {
    /// Build a registration record. New users always start as `pending` with
    /// no membership and no page access.
    pub fn registration(
        username: &str,
        email: &str,
        password_hash: HashedSecret,
        created_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            username: normalize_username(username)?,
            email: normalize_email(email)?,
            password_hash,
            role: CoreRole::Pending,
            page_access: PageAccess::none(),
            created_at,
        })
    }

    pub fn into_record(self, id: UserId) -> UserRecord {
        UserRecord {
            id,
            username: self.username,
            email: self.email,
            password_hash: self.password_hash,
            role: self.role,
            membership: MembershipTier::None,
            page_access: self.page_access,
            created_at: self.created_at,
        }
    }
}

/// Field-level change to a user's access. `None` leaves the field as is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessUpdate {
    pub role: Option<CoreRole>,
    pub membership: Option<MembershipTier>,
    pub page_access: Option<PageAccess>,
}

impl AccessUpdate {
    pub fn role(role: CoreRole) -> Self {
        Self { role: Some(role), ..Default::default() }
    }

    pub fn membership(membership: MembershipTier) -> Self {
        Self { membership: Some(membership), ..Default::default() }
    }

    pub fn page_access(page_access: PageAccess) -> Self {
        Self { page_access: Some(page_access), ..Default::default() }
    }
}

pub fn normalize_username(raw: &str) -> Result<String, DomainError> {
    let username = raw.trim();
    let len = username.chars().count();
    if !(3..=32).contains(&len) {
        return Err(DomainError::validation("username must be 3..=32 characters"));
    }
    if username.contains('@') {
        return Err(DomainError::validation("username cannot look like an email"));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
    {
        return Err(DomainError::validation("username may only contain letters, digits, '_', '.', '-'"));
    }
    Ok(username.to_string())
}

pub fn normalize_email(raw: &str) -> Result<String, DomainError> {
    let email = raw.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') && !domain.contains('@') => {
            Ok(email)
        }
        _ => Err(DomainError::validation("invalid email format")),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Role state machine
// ─────────────────────────────────────────────────────────────────────────────

/// Decide whether `actor` may move `target` from its current role to `new_role`.
///
/// `pending → standard → admin` is an admin action, `admin → superadmin` needs
/// a superadmin. Demotion mirrors promotion. Concretely:
/// - the actor must be at least admin and cannot change its own role;
/// - an admin may only touch users below admin and may grant any role up to
///   and including admin;
/// - only a superadmin grants or revokes superadmin.
pub fn authorize_role_change(
    actor: &CoreIdentity,
    target: &UserRecord,
    new_role: CoreRole,
) -> Result<(), DomainError> {
    if actor.role < CoreRole::Admin {
        return Err(DomainError::Unauthorized);
    }
    if actor.id == target.id {
        return Err(DomainError::invariant("cannot change your own role"));
    }
    if target.role == new_role {
        return Err(DomainError::invariant(format!("user already has role '{new_role}'")));
    }
    if actor.role == CoreRole::Superadmin {
        return Ok(());
    }
    if target.role >= CoreRole::Admin || new_role > CoreRole::Admin {
        return Err(DomainError::Unauthorized);
    }
    Ok(())
}

/// Decide whether `actor` may change membership or page access of `target`.
///
/// Admins manage users below their own level; superadmins manage everyone.
pub fn authorize_access_change(actor: &CoreIdentity, target: &UserRecord) -> Result<(), DomainError> {
    match actor.role {
        CoreRole::Superadmin => Ok(()),
        CoreRole::Admin if target.role < CoreRole::Admin => Ok(()),
        _ => Err(DomainError::Unauthorized),
    }
}

/// Page grants additionally require the target to be out of `pending`.
/// Clearing a pending user's pages is always allowed.
pub fn authorize_page_grant(
    actor: &CoreIdentity,
    target: &UserRecord,
    pages: &PageAccess,
) -> Result<(), DomainError> {
    authorize_access_change(actor, target)?;
    if target.role == CoreRole::Pending && !pages.is_empty() {
        return Err(DomainError::invariant("pending users cannot be granted page access"));
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Service users
// ─────────────────────────────────────────────────────────────────────────────

/// Staff profile linked to a service user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffAccess {
    pub display_name: String,
    pub employee_id: String,
    pub department: String,
    pub scope: PageAccess,
}

/// A service (staff) user as persisted. Never shares an id with a core user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceUserRecord {
    pub id: ServiceUserId,
    pub employee_id: String,
    pub email: String,
    pub password_hash: HashedSecret,
    pub role: ServiceRole,
    pub department: String,
    pub staff: StaffAccess,
    pub created_at: DateTime<Utc>,
}

impl ServiceUserRecord {
    pub fn identity(&self) -> ServiceIdentity {
        ServiceIdentity {
            id: self.id,
            employee_id: self.employee_id.clone(),
            display_name: self.staff.display_name.clone(),
            role: self.role,
            department: self.department.clone(),
            scope: self.staff.scope.clone(),
        }
    }
}

/// Validated input for inserting a new service user.
#[derive(Debug, Clone)]
pub struct NewServiceUser {
    pub employee_id: String,
    pub email: String,
    pub password_hash: HashedSecret,
    pub role: ServiceRole,
    pub department: String,
    pub staff: StaffAccess,
    pub created_at: DateTime<Utc>,
}

impl NewServiceUser {
    pub fn enroll(
        employee_id: &str,
        display_name: &str,
        department: &str,
        role: ServiceRole,
        scope: PageAccess,
        password_hash: HashedSecret,
        created_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let employee_id = normalize_employee_id(employee_id)?;
        let display_name = display_name.trim();
        if display_name.is_empty() {
            return Err(DomainError::validation("display name cannot be empty"));
        }
        let department = department.trim().to_lowercase();
        if department.is_empty() {
            return Err(DomainError::validation("department cannot be empty"));
        }

        Ok(Self {
            email: format!("{}@{}", employee_id.to_lowercase(), STAFF_EMAIL_DOMAIN),
            staff: StaffAccess {
                display_name: display_name.to_string(),
                employee_id: employee_id.clone(),
                department: department.clone(),
                scope,
            },
            employee_id,
            password_hash,
            role,
            department,
            created_at,
        })
    }

    pub fn into_record(self, id: ServiceUserId) -> ServiceUserRecord {
        ServiceUserRecord {
            id,
            employee_id: self.employee_id,
            email: self.email,
            password_hash: self.password_hash,
            role: self.role,
            department: self.department,
            staff: self.staff,
            created_at: self.created_at,
        }
    }
}

/// Employee ids are matched case-insensitively and stored uppercased.
pub fn normalize_employee_id(raw: &str) -> Result<String, DomainError> {
    let id = raw.trim().to_uppercase();
    if id.is_empty() || id.len() > 32 || !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(DomainError::validation("employee id must be 1..=32 of [A-Z0-9-]"));
    }
    Ok(id)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
