//! Public authentication endpoints: registration and both login flavours.

use std::sync::Arc;

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use bizops_auth::{Capability, Identity};
use bizops_infra::{LoginOutcome, Registration};

use crate::app::{errors, services::AppServices};

// ─────────────────────────────────────────────────────────────────────────────
// Request DTOs
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Username or email for core users, employee id for staff.
    pub identifier: String,
    pub secret: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// POST /auth/register - new accounts always start pending.
pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<Registration>,
) -> axum::response::Response {
    match services.issuer.register(body, Utc::now()).await {
        Ok(record) => errors::success(
            StatusCode::CREATED,
            "registration received; an administrator must approve the account",
            Some(json!({
                "id": record.id.to_string(),
                "username": record.username,
                "role": record.role,
            })),
        ),
        Err(e) => errors::auth_error_to_response(e),
    }
}

/// POST /auth/login
pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<LoginRequest>,
) -> axum::response::Response {
    match services.issuer.login(&body.identifier, &body.secret, Utc::now()).await {
        Ok(outcome) => login_response(outcome),
        Err(e) => errors::auth_error_to_response(e),
    }
}

/// POST /auth/service/login
pub async fn service_login(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<LoginRequest>,
) -> axum::response::Response {
    match services.issuer.service_login(&body.identifier, &body.secret, Utc::now()).await {
        Ok(outcome) => login_response(outcome),
        Err(e) => errors::auth_error_to_response(e),
    }
}

fn login_response(outcome: LoginOutcome) -> axum::response::Response {
    let identity = &outcome.identity;
    let membership = match identity {
        Identity::Core(core) => json!(core.membership),
        Identity::Service(_) => serde_json::Value::Null,
    };

    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "message": "login successful",
            "token": outcome.token.token,
            "expiresAt": outcome.token.expires_at,
            "username": identity.username(),
            "role": identity.role_name(),
            "membership": membership,
            "pageAccess": identity.page_access().to_strings(),
        })),
    )
        .into_response()
}
