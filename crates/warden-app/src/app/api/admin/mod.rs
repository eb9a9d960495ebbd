//! Administrative endpoints. Every route declares a global requirement.

use salvo::Router;

use crate::middleware::authorize::RequirePermission;
use warden_core::constants::ADMIN_ROUTE_COMPONENT;
use warden_service::authz::Scope;

mod cache;
mod roles;

#[must_use]
pub fn routes() -> Router {
    Router::with_path(ADMIN_ROUTE_COMPONENT)
        .push(
            Router::with_path("roles")
                .hoop(RequirePermission::new("roles", "assign").with_scope(Scope::Global))
                .push(Router::with_path("assign").post(roles::assign_role))
                .push(
                    Router::with_path("{user_id}/workspaces/{workspace_id}")
                        .delete(roles::revoke_membership),
                ),
        )
        .push(
            Router::with_path("cache")
                .hoop(RequirePermission::new("cache", "flush").with_scope(Scope::Global))
                .push(Router::with_path("flush").post(cache::flush_entry))
                .push(Router::with_path("{user_id}").delete(cache::flush_user)),
        )
}
