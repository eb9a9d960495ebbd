use std::str::FromStr;

use salvo::{Depot, Request, Response, handler, http::StatusCode, writing::Json};

use crate::depot::get_actor_from_depot;
use crate::engine_handler::get_engine_from_depot;
use crate::error::{AppResult, ErrorResponse, render_error};
use warden_core::error::CoreError;
use warden_core::types::{UserId, WorkspaceId};
use warden_service::authz::RoleAssignment;

/// ## Summary
/// POST /api/admin/roles/assign - Changes a user's global role, workspace
/// role, or both.
///
/// Body: `{target_user_id, global_role?, workspace_role?, workspace_id?}`.
///
/// ## Side Effects
/// Writes the role store, records a role change audit entry per changed role,
/// and drops every cached permission set of the target.
///
/// ## Errors
/// Returns HTTP 400 for malformed or invalid assignments, HTTP 403 when a
/// non-owner grants OWNER, HTTP 404 for an unknown target, and HTTP 500 on
/// storage failure.
#[handler]
pub async fn assign_role(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let assignment: RoleAssignment = match req.parse_json().await {
        Ok(assignment) => assignment,
        Err(e) => {
            tracing::debug!(error = %e, "Failed to parse role assignment");
            res.status_code(StatusCode::BAD_REQUEST);
            res.render(Json(ErrorResponse {
                error: "Invalid request body".to_string(),
            }));
            return;
        }
    };

    match apply(depot, assignment).await {
        Ok(()) => {
            res.status_code(StatusCode::NO_CONTENT);
        }
        Err(e) => render_error(res, &e),
    }
}

async fn apply(depot: &Depot, assignment: RoleAssignment) -> AppResult<()> {
    let engine = get_engine_from_depot(depot)?;
    let by = get_actor_from_depot(depot)?;
    engine.assign_role(by, assignment).await?;
    Ok(())
}

/// ## Summary
/// DELETE /api/admin/roles/{user_id}/workspaces/{workspace_id} - Ends a
/// workspace membership.
///
/// ## Errors
/// Returns HTTP 400 for malformed ids, HTTP 404 when there is no such
/// membership, and HTTP 500 on storage failure.
#[handler]
pub async fn revoke_membership(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    match revoke(req, depot).await {
        Ok(true) => {
            res.status_code(StatusCode::NO_CONTENT);
        }
        Ok(false) => {
            res.status_code(StatusCode::NOT_FOUND);
            res.render(Json(ErrorResponse {
                error: "Membership not found".to_string(),
            }));
        }
        Err(e) => render_error(res, &e),
    }
}

async fn revoke(req: &Request, depot: &Depot) -> AppResult<bool> {
    let user_id: UserId = path_param(req, "user_id")?;
    let workspace_id: WorkspaceId = path_param(req, "workspace_id")?;
    let engine = get_engine_from_depot(depot)?;
    let by = get_actor_from_depot(depot)?;
    Ok(engine.revoke_membership(by, user_id, workspace_id).await?)
}

/// Parses a path parameter into one of the id newtypes.
pub(super) fn path_param<T>(req: &Request, name: &'static str) -> AppResult<T>
where
    T: FromStr<Err = CoreError>,
{
    let raw = req
        .param::<String>(name)
        .ok_or(CoreError::InvariantViolation("Route is missing a path parameter"))?;
    Ok(raw.parse()?)
}
