use axum::{
    extract::{Extension, Path},
    http::StatusCode,
};
use serde_json::json;

use bizops_auth::{Identity, require_page_access};

use crate::app::errors;
use crate::authz;

/// GET /pages/:slug - may the caller open this feature page?
pub async fn check_page(
    Extension(identity): Extension<Identity>,
    Path(slug): Path<String>,
) -> axum::response::Response {
    let page = match authz::page(&slug) {
        Ok(page) => page,
        Err(resp) => return resp,
    };
    if let Err(resp) = authz::guard(require_page_access(&identity, &page)) {
        return resp;
    }

    errors::success(StatusCode::OK, "access granted", Some(json!({ "page": page.as_str() })))
}
