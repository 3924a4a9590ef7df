use axum::{
    Router,
    routing::{get, patch, post, put},
};

pub mod admin;
pub mod auth;
pub mod laundry;
pub mod pages;
pub mod system;

/// Endpoints that need no token.
pub fn public_router() -> Router {
    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/service/login", post(auth::service_login))
}

/// Endpoints behind the core gate.
pub fn core_router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .route("/pages/:slug", get(pages::check_page))
        .route("/admin/users", get(admin::list_users))
        .route("/admin/users/:id/role", patch(admin::change_role))
        .route("/admin/users/:id/membership", patch(admin::set_membership))
        .route("/admin/users/:id/pages", put(admin::set_pages))
        .route("/admin/staff", post(admin::enroll_staff))
        .route("/laundry/tickets", post(laundry::open_ticket))
        .route("/laundry/tickets/:id", patch(laundry::advance_ticket))
}

/// Endpoints behind the service gate (mounted under `/service`).
pub fn service_router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .route("/laundry/tickets", get(laundry::list_tickets))
        .route(
            "/laundry/tickets/:id",
            patch(laundry::service_advance_ticket).delete(laundry::remove_ticket),
        )
}
