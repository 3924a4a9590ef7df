//! `bizops-auth`: pure authentication/authorization boundary.
//!
//! Token codec, password hashing, identities and policy guards. This crate is
//! intentionally decoupled from HTTP and storage.

pub mod authorize;
pub mod claims;
pub mod error;
pub mod pages;
pub mod password;
pub mod principal;
pub mod roles;
pub mod token;
pub mod user;

pub use authorize::{
    AuthzError, CORE_STAFF_ROLES, PartitionRole, require_any_role, require_page_access, require_role,
};
pub use claims::{SessionClaims, TokenValidationError, validate_claims};
pub use error::AuthError;
pub use pages::{PageAccess, PageSlug, WILDCARD_PAGE};
pub use password::{HashedSecret, PasswordPolicy, burn_verification, hash_secret, verify_secret};
pub use principal::{Capability, CoreIdentity, Identity, ServiceIdentity};
pub use roles::{CoreRole, MembershipTier, Partition, ServiceRole};
pub use token::{DEFAULT_TOKEN_TTL_HOURS, IssuedToken, TokenCodec};
pub use user::{
    AccessUpdate, NewServiceUser, NewUser, ServiceUserRecord, StaffAccess, UserRecord,
    authorize_access_change, authorize_page_grant, authorize_role_change, normalize_email, normalize_employee_id, normalize_username,
};
