//! Depot helpers for the identity and context a request carries.

use warden_core::types::{TenantId, WorkspaceId};
use warden_service::authz::Actor;
use warden_service::error::ServiceError;

use crate::error::AppResult;

pub mod depot_keys {
    pub const ACTOR: &str = "__actor";
    pub const REQUEST_CONTEXT: &str = "__request_context";
}

/// Tenant and workspace the request is made in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub tenant_id: Option<TenantId>,
    pub workspace_id: Option<WorkspaceId>,
}

/// Get the actor from the depot.
///
/// ## Errors
///
/// Returns `NotAuthenticated` if no actor was identified for the request.
pub fn get_actor_from_depot(depot: &salvo::Depot) -> AppResult<&Actor> {
    depot
        .get::<Actor>(depot_keys::ACTOR)
        .map_err(|_e| ServiceError::NotAuthenticated.into())
}

/// Context of the request, empty when no middleware recorded one.
#[must_use]
pub fn get_context_from_depot(depot: &salvo::Depot) -> RequestContext {
    depot
        .get::<RequestContext>(depot_keys::REQUEST_CONTEXT)
        .ok()
        .copied()
        .unwrap_or_default()
}
