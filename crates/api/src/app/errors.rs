//! Response envelope and error → status mapping.
//!
//! Every response body is `{success, message, data?}`; failures also carry a
//! machine-readable `error` code.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::{Value, json};

use bizops_auth::AuthError;
use bizops_core::DomainError;
use bizops_infra::AdminError;

pub fn success(status: StatusCode, message: impl Into<String>, data: Option<Value>) -> axum::response::Response {
    let mut body = json!({
        "success": true,
        "message": message.into(),
    });
    if let Some(data) = data {
        body["data"] = data;
    }
    (status, axum::Json(body)).into_response()
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "success": false,
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn auth_status(err: &AuthError) -> StatusCode {
    match err {
        AuthError::MissingToken
        | AuthError::InvalidToken
        | AuthError::TokenExpired
        | AuthError::StaleIdentity
        | AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        AuthError::Forbidden(_) | AuthError::AccountPending | AuthError::NotServiceStaff => StatusCode::FORBIDDEN,
        AuthError::DuplicateIdentity => StatusCode::CONFLICT,
        AuthError::Validation(_) => StatusCode::BAD_REQUEST,
        AuthError::AuthServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn auth_error_to_response(err: AuthError) -> axum::response::Response {
    if let AuthError::Internal(detail) = &err {
        tracing::error!(%detail, "internal error while handling request");
    }
    json_error(auth_status(&err), err.code(), err.to_string())
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        DomainError::InvariantViolation(msg) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invariant_violation", msg)
        }
        DomainError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        DomainError::Unauthorized => json_error(StatusCode::FORBIDDEN, "forbidden", "insufficient privileges"),
    }
}

pub fn admin_error_to_response(err: AdminError) -> axum::response::Response {
    match err {
        AdminError::Auth(e) => auth_error_to_response(e),
        AdminError::Domain(e) => domain_error_to_response(e),
        AdminError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "user not found"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_errors_map_to_status_classes() {
        assert_eq!(auth_status(&AuthError::MissingToken), StatusCode::UNAUTHORIZED);
        assert_eq!(auth_status(&AuthError::TokenExpired), StatusCode::UNAUTHORIZED);
        assert_eq!(auth_status(&AuthError::StaleIdentity), StatusCode::UNAUTHORIZED);
        assert_eq!(auth_status(&AuthError::AccountPending), StatusCode::FORBIDDEN);
        assert_eq!(auth_status(&AuthError::NotServiceStaff), StatusCode::FORBIDDEN);
        assert_eq!(auth_status(&AuthError::DuplicateIdentity), StatusCode::CONFLICT);
        assert_eq!(auth_status(&AuthError::AuthServiceUnavailable), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            auth_status(&AuthError::internal("db exploded")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_detail_never_reaches_the_message() {
        let err = AuthError::internal("connection string postgres://secret");
        assert!(!err.to_string().contains("postgres"));
    }
}
