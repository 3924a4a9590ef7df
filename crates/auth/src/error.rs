use thiserror::Error;

use crate::AuthzError;

/// Every way an authentication or authorization step can fail.
///
/// All variants are terminal for the current request. `Internal` carries
/// detail for server-side logs only; its `Display` is deliberately generic.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing bearer token")]
    MissingToken,

    #[error("invalid token")]
    InvalidToken,

    #[error("token has expired")]
    TokenExpired,

    #[error("identity no longer exists")]
    StaleIdentity,

    #[error("identity is not service staff")]
    NotServiceStaff,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("account is pending approval")]
    AccountPending,

    #[error("identity already exists")]
    DuplicateIdentity,

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("authentication service unavailable")]
    AuthServiceUnavailable,

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("internal error")]
    Internal(String),
}

impl AuthError {
    pub fn internal(detail: impl Into<String>) -> Self {
        Self::Internal(detail.into())
    }

    /// Stable machine-readable code for the error envelope.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "missing_token",
            AuthError::InvalidToken => "invalid_token",
            AuthError::TokenExpired => "token_expired",
            AuthError::StaleIdentity => "stale_identity",
            AuthError::NotServiceStaff => "not_service_staff",
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::AccountPending => "account_pending",
            AuthError::DuplicateIdentity => "duplicate_identity",
            AuthError::Forbidden(_) => "forbidden",
            AuthError::AuthServiceUnavailable => "auth_service_unavailable",
            AuthError::Validation(_) => "validation_error",
            AuthError::Internal(_) => "internal_error",
        }
    }
}

impl From<AuthzError> for AuthError {
    fn from(value: AuthzError) -> Self {
        AuthError::Forbidden(value.to_string())
    }
}
