//! Authorization policy: role and page-access guards.
//!
//! Guards run after the access gate has resolved an [`Identity`]. They are
//! pure (no IO), and each is independent so routes can stack them.

use thiserror::Error;

use crate::{Capability, CoreRole, Identity, PageSlug, Partition, ServiceRole};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("requires a {expected} identity, got {actual}")]
    WrongPartition { expected: Partition, actual: Partition },

    #[error("role '{actual}' is below required '{required}'")]
    RoleTooLow { required: &'static str, actual: &'static str },

    #[error("role '{actual}' is not one of {allowed:?}")]
    RoleNotAllowed { allowed: Vec<&'static str>, actual: &'static str },

    #[error("no access to page '{0}'")]
    PageNotGranted(String),

    #[error("account is pending approval")]
    PendingAccount,
}

/// A role vocabulary bound to exactly one partition.
///
/// Role requirements are typed by partition, so a core role name can never be
/// satisfied by a service identity (or vice versa) even if the strings match.
pub trait PartitionRole: Copy + Ord + core::fmt::Debug {
    const PARTITION: Partition;

    fn of(identity: &Identity) -> Option<Self>;

    fn name(&self) -> &'static str;
}

impl PartitionRole for CoreRole {
    const PARTITION: Partition = Partition::Core;

    fn of(identity: &Identity) -> Option<Self> {
        identity.as_core().map(|core| core.role)
    }

    fn name(&self) -> &'static str {
        self.as_str()
    }
}

impl PartitionRole for ServiceRole {
    const PARTITION: Partition = Partition::Service;

    fn of(identity: &Identity) -> Option<Self> {
        identity.as_service().map(|service| service.role)
    }

    fn name(&self) -> &'static str {
        self.as_str()
    }
}

fn role_in_partition<R: PartitionRole>(identity: &Identity) -> Result<R, AuthzError> {
    R::of(identity).ok_or(AuthzError::WrongPartition {
        expected: R::PARTITION,
        actual: identity.partition(),
    })
}

/// Require `identity.role >= min` within `min`'s partition.
pub fn require_role<R: PartitionRole>(identity: &Identity, min: R) -> Result<(), AuthzError> {
    let role = role_in_partition::<R>(identity)?;
    if role >= min {
        Ok(())
    } else {
        Err(AuthzError::RoleTooLow {
            required: min.name(),
            actual: role.name(),
        })
    }
}

/// Require `identity.role` to be one of `allowed`, within their partition.
pub fn require_any_role<R: PartitionRole>(identity: &Identity, allowed: &[R]) -> Result<(), AuthzError> {
    let role = role_in_partition::<R>(identity)?;
    if allowed.contains(&role) {
        Ok(())
    } else {
        Err(AuthzError::RoleNotAllowed {
            allowed: allowed.iter().map(|r| r.name()).collect(),
            actual: role.name(),
        })
    }
}

/// Require `slug` in the identity's page allowlist (or the `all` wildcard).
///
/// A pending core user has no page access whatever its stored allowlist says.
pub fn require_page_access(identity: &Identity, slug: &PageSlug) -> Result<(), AuthzError> {
    if let Some(core) = identity.as_core() {
        if core.role == CoreRole::Pending {
            return Err(AuthzError::PendingAccount);
        }
    }
    if identity.page_access().allows(slug) {
        Ok(())
    } else {
        Err(AuthzError::PageNotGranted(slug.as_str().to_string()))
    }
}

/// Roles allowed to run day-to-day staff operations in the core partition.
pub const CORE_STAFF_ROLES: [CoreRole; 3] = [CoreRole::Standard, CoreRole::Admin, CoreRole::Superadmin];

#[cfg(test)]
mod tests {
    use bizops_core::{ServiceUserId, UserId};
    use proptest::prelude::*;

    use super::*;
    use crate::{CoreIdentity, MembershipTier, PageAccess, ServiceIdentity};

    fn core(role: CoreRole, pages: &[&str]) -> Identity {
        Identity::Core(CoreIdentity {
            id: UserId::new(),
            username: "alice".to_string(),
            role,
            membership: MembershipTier::None,
            page_access: PageAccess::parse(pages.iter().copied()).unwrap(),
        })
    }

    fn service(role: ServiceRole) -> Identity {
        Identity::Service(ServiceIdentity {
            id: ServiceUserId::new(),
            employee_id: "E42".to_string(),
            display_name: "Sam".to_string(),
            role,
            department: "laundry".to_string(),
            scope: PageAccess::parse(["laundry"]).unwrap(),
        })
    }

    fn core_role() -> impl Strategy<Value = CoreRole> {
        prop::sample::select(CoreRole::ALL.to_vec())
    }

    #[test]
    fn standard_passes_standard_but_not_admin() {
        let alice = core(CoreRole::Standard, &[]);
        assert!(require_role(&alice, CoreRole::Standard).is_ok());
        assert!(matches!(
            require_role(&alice, CoreRole::Admin),
            Err(AuthzError::RoleTooLow { required: "admin", actual: "standard" })
        ));
    }

    #[test]
    fn pending_is_excluded_from_staff_roles() {
        let pending = core(CoreRole::Pending, &["all"]);
        assert!(require_any_role(&pending, &CORE_STAFF_ROLES).is_err());
        assert!(require_any_role(&core(CoreRole::Standard, &[]), &CORE_STAFF_ROLES).is_ok());
    }

    #[test]
    fn service_identity_never_matches_core_vocabulary() {
        let staff = service(ServiceRole::Standard);
        assert!(matches!(
            require_any_role(&staff, &CORE_STAFF_ROLES),
            Err(AuthzError::WrongPartition { expected: Partition::Core, actual: Partition::Service })
        ));
        assert!(require_any_role(&staff, &[ServiceRole::Standard, ServiceRole::Admin]).is_ok());
    }

    #[test]
    fn service_admin_requirement() {
        assert!(require_role(&service(ServiceRole::Admin), ServiceRole::Admin).is_ok());
        assert!(require_role(&service(ServiceRole::Standard), ServiceRole::Admin).is_err());
    }

    #[test]
    fn page_access_wildcard_and_exact() {
        let stocks = PageSlug::parse("stocks").unwrap();
        assert!(require_page_access(&core(CoreRole::Standard, &["all"]), &stocks).is_ok());
        assert!(require_page_access(&core(CoreRole::Standard, &["stocks"]), &stocks).is_ok());
        assert_eq!(
            require_page_access(&core(CoreRole::Superadmin, &["laundry"]), &stocks),
            Err(AuthzError::PageNotGranted("stocks".to_string()))
        );
    }

    #[test]
    fn pending_identity_has_no_page_access() {
        let stocks = PageSlug::parse("stocks").unwrap();
        assert_eq!(
            require_page_access(&core(CoreRole::Pending, &["all"]), &stocks),
            Err(AuthzError::PendingAccount)
        );
    }

    proptest! {
        #[test]
        fn require_role_matches_hierarchy(actual in core_role(), min in core_role()) {
            let identity = core(actual, &[]);
            prop_assert_eq!(require_role(&identity, min).is_ok(), actual >= min);
        }

        #[test]
        fn core_identities_never_pass_service_guards(actual in core_role()) {
            let identity = core(actual, &["all"]);
            prop_assert!(require_role(&identity, ServiceRole::Standard).is_err());
            prop_assert!(require_any_role(&identity, &[ServiceRole::Standard, ServiceRole::Admin]).is_err());
        }
    }
}
