mod admin;
mod app_specific;
mod authz;

use salvo::Router;

use crate::middleware::actor::ActorMiddleware;

// Re-export route constants from core
pub use warden_core::constants::{
    ADMIN_ROUTE_COMPONENT, ADMIN_ROUTE_PREFIX, API_ROUTE_COMPONENT, API_ROUTE_PREFIX,
    AUTHZ_ROUTE_COMPONENT, AUTHZ_ROUTE_PREFIX,
};

/// ## Summary
/// Constructs the main API router.
///
/// The engine must be injected by an outer hoop (see
/// [`EngineHandler`](crate::engine_handler::EngineHandler)).
///
/// ## Errors
/// Returns an error if any child route handler fails to initialize.
pub fn routes() -> anyhow::Result<Router> {
    Ok(Router::with_path(API_ROUTE_COMPONENT)
        .hoop(ActorMiddleware)
        .push(app_specific::routes())
        .push(authz::routes())
        .push(admin::routes()))
}
