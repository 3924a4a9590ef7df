//! Admin routes for account approval and access management.
//!
//! Role guards run here first; `AccessAdmin` re-checks the actor against the
//! target before anything is written.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path},
    http::StatusCode,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};

use bizops_auth::{CoreRole, Identity, MembershipTier, PageAccess, ServiceUserRecord, UserRecord, require_role};
use bizops_core::UserId;
use bizops_infra::EnrollStaff;

use crate::app::{errors, services::AppServices};
use crate::authz;

// ─────────────────────────────────────────────────────────────────────────────
// Request DTOs
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ChangeRoleRequest {
    pub role: String,
}

#[derive(Debug, Deserialize)]
pub struct MembershipRequest {
    pub membership: String,
}

#[derive(Debug, Deserialize)]
pub struct PagesRequest {
    pub pages: Vec<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// GET /admin/users
pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<Identity>,
) -> axum::response::Response {
    let actor = match admin_actor(&identity) {
        Ok(actor) => actor,
        Err(resp) => return resp,
    };

    match services.admin.list_users(actor).await {
        Ok(users) => {
            let users: Vec<Value> = users.iter().map(user_view).collect();
            errors::success(StatusCode::OK, "users", Some(json!({ "users": users })))
        }
        Err(e) => errors::admin_error_to_response(e),
    }
}

/// PATCH /admin/users/:id/role
pub async fn change_role(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
    Json(body): Json<ChangeRoleRequest>,
) -> axum::response::Response {
    let actor = match admin_actor(&identity) {
        Ok(actor) => actor,
        Err(resp) => return resp,
    };
    let target = match id.parse::<UserId>() {
        Ok(target) => target,
        Err(e) => return errors::domain_error_to_response(e),
    };
    let role = match body.role.parse::<CoreRole>() {
        Ok(role) => role,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.admin.change_role(actor, target, role).await {
        Ok(user) => errors::success(StatusCode::OK, "role updated", Some(user_view(&user))),
        Err(e) => errors::admin_error_to_response(e),
    }
}

/// PATCH /admin/users/:id/membership
pub async fn set_membership(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
    Json(body): Json<MembershipRequest>,
) -> axum::response::Response {
    let actor = match admin_actor(&identity) {
        Ok(actor) => actor,
        Err(resp) => return resp,
    };
    let target = match id.parse::<UserId>() {
        Ok(target) => target,
        Err(e) => return errors::domain_error_to_response(e),
    };
    let membership = match body.membership.parse::<MembershipTier>() {
        Ok(membership) => membership,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.admin.set_membership(actor, target, membership).await {
        Ok(user) => errors::success(StatusCode::OK, "membership updated", Some(user_view(&user))),
        Err(e) => errors::admin_error_to_response(e),
    }
}

/// PUT /admin/users/:id/pages - replaces the whole allowlist.
pub async fn set_pages(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
    Json(body): Json<PagesRequest>,
) -> axum::response::Response {
    let actor = match admin_actor(&identity) {
        Ok(actor) => actor,
        Err(resp) => return resp,
    };
    let target = match id.parse::<UserId>() {
        Ok(target) => target,
        Err(e) => return errors::domain_error_to_response(e),
    };
    let pages = match PageAccess::parse(&body.pages) {
        Ok(pages) => pages,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.admin.set_page_access(actor, target, pages).await {
        Ok(user) => errors::success(StatusCode::OK, "page access updated", Some(user_view(&user))),
        Err(e) => errors::admin_error_to_response(e),
    }
}

/// POST /admin/staff - create a service user with its staff profile.
pub async fn enroll_staff(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<Identity>,
    Json(body): Json<EnrollStaff>,
) -> axum::response::Response {
    let actor = match admin_actor(&identity) {
        Ok(actor) => actor,
        Err(resp) => return resp,
    };

    match services.admin.enroll_staff(actor, body, Utc::now()).await {
        Ok(staff) => errors::success(StatusCode::CREATED, "staff enrolled", Some(staff_view(&staff))),
        Err(e) => errors::admin_error_to_response(e),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn admin_actor(identity: &Identity) -> Result<&bizops_auth::CoreIdentity, axum::response::Response> {
    authz::guard(require_role(identity, CoreRole::Admin))?;
    authz::core_actor(identity)
}

/// Public view of a user record; the password hash never leaves the store.
fn user_view(user: &UserRecord) -> Value {
    json!({
        "id": user.id.to_string(),
        "username": user.username,
        "email": user.email,
        "role": user.role,
        "membership": user.membership,
        "pageAccess": user.page_access.to_strings(),
        "createdAt": user.created_at,
    })
}

fn staff_view(staff: &ServiceUserRecord) -> Value {
    json!({
        "id": staff.id.to_string(),
        "employeeId": staff.employee_id,
        "displayName": staff.staff.display_name,
        "department": staff.department,
        "role": staff.role,
        "scope": staff.staff.scope.to_strings(),
    })
}
