//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: credential store selection and auth service wiring
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `errors.rs`: response envelope and error mapping

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use crate::middleware::{self, GateState};

pub mod errors;
pub mod routes;
pub mod services;

pub use services::{AppServices, build_services};

/// Build the full HTTP router (public entrypoint used by `main.rs` and tests).
///
/// Three route groups: public (no token), core-gated and service-gated. Each
/// gated group has its own gate, so a route can never be reached with an
/// identity from the other partition.
pub fn build_app(services: AppServices) -> Router {
    let gate_state = GateState {
        gate: services.gate.clone(),
    };
    let services = Arc::new(services);

    let core = routes::core_router().route_layer(axum::middleware::from_fn_with_state(
        gate_state.clone(),
        middleware::core_gate,
    ));

    let service = routes::service_router().route_layer(axum::middleware::from_fn_with_state(
        gate_state,
        middleware::service_gate,
    ));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::public_router())
        .merge(core)
        .nest("/service", service)
        .layer(ServiceBuilder::new().layer(Extension(services)))
}
