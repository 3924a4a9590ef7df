//! Request gates: authenticate the bearer token, re-resolve the subject in
//! the right partition, and attach the fresh `Identity` to the request.

use axum::{
    extract::State,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use bizops_infra::AccessGate;

use crate::app::errors;

#[derive(Clone)]
pub struct GateState {
    pub gate: AccessGate,
}

pub async fn core_gate(
    State(state): State<GateState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let header = authorization_header(req.headers());
    let identity = state.gate.authenticate_core(header.as_deref(), Utc::now()).await;

    match identity {
        Ok(identity) => {
            req.extensions_mut().insert(identity);
            next.run(req).await
        }
        Err(err) => errors::auth_error_to_response(err),
    }
}

pub async fn service_gate(
    State(state): State<GateState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let header = authorization_header(req.headers());
    let identity = state.gate.authenticate_service(header.as_deref(), Utc::now()).await;

    match identity {
        Ok(identity) => {
            req.extensions_mut().insert(identity);
            next.run(req).await
        }
        Err(err) => errors::auth_error_to_response(err),
    }
}

/// Owned so no borrow of the request is held across the store lookup. A
/// header that is not visible ASCII counts as absent.
fn authorization_header(headers: &HeaderMap) -> Option<String> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
}
