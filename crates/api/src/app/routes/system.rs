use axum::{extract::Extension, http::StatusCode};
use serde_json::json;

use bizops_auth::{Capability, Identity};

use crate::app::errors;

pub async fn health() -> axum::response::Response {
    errors::success(StatusCode::OK, "ok", None)
}

/// Mounted behind both gates; reports whichever identity the gate resolved.
pub async fn whoami(Extension(identity): Extension<Identity>) -> axum::response::Response {
    let data = json!({
        "subject": identity.subject().to_string(),
        "username": identity.username(),
        "partition": identity.partition(),
        "role": identity.role_name(),
        "pageAccess": identity.page_access().to_strings(),
        "identity": identity,
    });
    errors::success(StatusCode::OK, "authenticated", Some(data))
}
