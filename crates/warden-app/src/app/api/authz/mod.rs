//! Decision endpoints for callers that gate their own requests.

use salvo::{Router, handler};

use crate::middleware::authorize::AuthorizeMiddleware;
use warden_core::constants::AUTHZ_ROUTE_COMPONENT;

mod check;
mod permissions;

/// ## Summary
/// GET /api/authz/forward - Forward-auth target. Reaching this handler means
/// the forwarded request was authorized.
#[handler]
async fn forward_allowed(res: &mut salvo::Response) {
    res.status_code(salvo::http::StatusCode::NO_CONTENT);
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path(AUTHZ_ROUTE_COMPONENT)
        .push(Router::with_path("check").post(check::check))
        .push(Router::with_path("me/permissions").get(permissions::my_permissions))
        .push(
            Router::with_path("forward")
                .hoop(AuthorizeMiddleware)
                .get(forward_allowed),
        )
}
