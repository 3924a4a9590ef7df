//! Handler-side guard helpers.
//!
//! Guards from `bizops-auth` run after the gate has attached an `Identity`;
//! these helpers turn their failures into envelope responses.

use axum::response::Response;

use bizops_auth::{AuthError, AuthzError, CoreIdentity, Identity, PageSlug};

use crate::app::errors;

pub fn guard(result: Result<(), AuthzError>) -> Result<(), Response> {
    result.map_err(|e| {
        tracing::info!(reason = %e, "request denied by role guard");
        errors::auth_error_to_response(AuthError::from(e))
    })
}

/// The core gate only attaches core identities, so a miss here means a route
/// was mounted behind the wrong gate.
pub fn core_actor(identity: &Identity) -> Result<&CoreIdentity, Response> {
    identity
        .as_core()
        .ok_or_else(|| errors::auth_error_to_response(AuthError::Forbidden("core identity required".into())))
}

pub fn page(slug: &str) -> Result<PageSlug, Response> {
    PageSlug::parse(slug).map_err(errors::domain_error_to_response)
}
