//! Laundry ticket endpoints, reachable from both partitions.
//!
//! Core users need a staff-level role plus the `laundry` page; service staff
//! are checked against service roles only.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path},
    http::StatusCode,
    response::Response,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use bizops_auth::{CORE_STAFF_ROLES, Capability, Identity, ServiceRole, require_any_role, require_page_access, require_role};
use bizops_core::TicketId;
use bizops_infra::TicketStatus;

use crate::app::{errors, services::AppServices};
use crate::authz;

const LAUNDRY_PAGE: &str = "laundry";
const SERVICE_ROLES: [ServiceRole; 2] = [ServiceRole::Standard, ServiceRole::Admin];

#[derive(Debug, Deserialize)]
pub struct OpenTicketRequest {
    pub customer: String,
    pub items: u32,
}

#[derive(Debug, Deserialize)]
pub struct AdvanceTicketRequest {
    pub status: TicketStatus,
}

fn core_laundry_guard(identity: &Identity) -> Result<(), Response> {
    authz::guard(require_any_role(identity, &CORE_STAFF_ROLES))?;
    let page = authz::page(LAUNDRY_PAGE)?;
    authz::guard(require_page_access(identity, &page))
}

fn ticket_id(raw: &str) -> Result<TicketId, Response> {
    raw.parse::<TicketId>().map_err(errors::domain_error_to_response)
}

// ─────────────────────────────────────────────────────────────────────────────
// Core partition
// ─────────────────────────────────────────────────────────────────────────────

/// POST /laundry/tickets
pub async fn open_ticket(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<Identity>,
    Json(body): Json<OpenTicketRequest>,
) -> Response {
    if let Err(resp) = core_laundry_guard(&identity) {
        return resp;
    }

    match services.tickets.open(&body.customer, body.items, identity.username(), Utc::now()) {
        Ok(ticket) => errors::success(StatusCode::CREATED, "ticket opened", Some(json!(ticket))),
        Err(e) => errors::domain_error_to_response(e),
    }
}

/// PATCH /laundry/tickets/:id
pub async fn advance_ticket(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
    Json(body): Json<AdvanceTicketRequest>,
) -> Response {
    if let Err(resp) = core_laundry_guard(&identity) {
        return resp;
    }
    advance(&services, &identity, &id, body.status)
}

// ─────────────────────────────────────────────────────────────────────────────
// Service partition
// ─────────────────────────────────────────────────────────────────────────────

/// GET /service/laundry/tickets
pub async fn list_tickets(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<Identity>,
) -> Response {
    if let Err(resp) = authz::guard(require_any_role(&identity, &SERVICE_ROLES)) {
        return resp;
    }

    let tickets = services.tickets.list();
    errors::success(StatusCode::OK, "tickets", Some(json!({ "tickets": tickets })))
}

/// PATCH /service/laundry/tickets/:id
pub async fn service_advance_ticket(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
    Json(body): Json<AdvanceTicketRequest>,
) -> Response {
    if let Err(resp) = authz::guard(require_any_role(&identity, &SERVICE_ROLES)) {
        return resp;
    }
    advance(&services, &identity, &id, body.status)
}

/// DELETE /service/laundry/tickets/:id - service admins only.
pub async fn remove_ticket(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> Response {
    if let Err(resp) = authz::guard(require_role(&identity, ServiceRole::Admin)) {
        return resp;
    }
    let id = match ticket_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.tickets.remove(id) {
        Ok(()) => {
            tracing::info!(ticket_id = %id, actor = identity.username(), "ticket removed");
            errors::success(StatusCode::OK, "ticket removed", None)
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}

fn advance(services: &AppServices, identity: &Identity, raw_id: &str, status: TicketStatus) -> Response {
    let id = match ticket_id(raw_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.tickets.advance(id, status, identity.username(), Utc::now()) {
        Ok(ticket) => errors::success(StatusCode::OK, "ticket updated", Some(json!(ticket))),
        Err(e) => errors::domain_error_to_response(e),
    }
}
