use salvo::{Depot, Response, handler, writing::Json};
use serde::Serialize;

use crate::depot::{get_actor_from_depot, get_context_from_depot};
use crate::engine_handler::get_engine_from_depot;
use crate::error::{AppResult, render_error};
use warden_core::types::{TenantId, UserId, WorkspaceId};
use warden_service::authz::{PermissionTriple, Role};

/// ## Summary
/// Effective permissions response payload
#[derive(Debug, Serialize)]
pub struct PermissionsResponse {
    pub user_id: UserId,
    pub role: Role,
    pub tenant_id: Option<TenantId>,
    pub workspace_id: Option<WorkspaceId>,
    pub permissions: Vec<PermissionTriple>,
}

/// ## Summary
/// GET /api/authz/me/permissions - Effective permissions of the caller in the
/// tenant and workspace named by the request headers.
///
/// ## Errors
/// Returns HTTP 401 without an actor and HTTP 500 if resolution fails.
#[handler]
pub async fn my_permissions(depot: &mut Depot, res: &mut Response) {
    match effective_permissions(depot).await {
        Ok(body) => res.render(Json(body)),
        Err(e) => render_error(res, &e),
    }
}

async fn effective_permissions(depot: &Depot) -> AppResult<PermissionsResponse> {
    let engine = get_engine_from_depot(depot)?;
    let actor = get_actor_from_depot(depot)?;
    let context = get_context_from_depot(depot);

    let permissions = engine
        .effective_permissions(actor.id, context.tenant_id, context.workspace_id)
        .await?;
    Ok(PermissionsResponse {
        user_id: actor.id,
        role: actor.role.clone(),
        tenant_id: context.tenant_id,
        workspace_id: context.workspace_id,
        permissions: permissions.as_slice().to_vec(),
    })
}
