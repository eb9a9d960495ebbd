use salvo::{Depot, Request, Response, handler, http::StatusCode, writing::Json};
use serde::Deserialize;

use super::roles::path_param;
use crate::engine_handler::get_engine_from_depot;
use crate::error::{AppResult, ErrorResponse, render_error};
use warden_core::types::{TenantId, UserId, WorkspaceId};

/// ## Summary
/// Point flush request payload
#[derive(Debug, Deserialize)]
pub struct FlushRequest {
    pub user_id: UserId,
    #[serde(default)]
    pub tenant_id: Option<TenantId>,
    #[serde(default)]
    pub workspace_id: Option<WorkspaceId>,
}

/// ## Summary
/// POST /api/admin/cache/flush - Drops the cached permission set of one
/// (user, tenant, workspace) context.
///
/// ## Errors
/// Returns HTTP 400 for a malformed body and HTTP 500 if the cache fails.
#[handler]
pub async fn flush_entry(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let body: FlushRequest = match req.parse_json().await {
        Ok(body) => body,
        Err(e) => {
            tracing::debug!(error = %e, "Failed to parse flush request");
            res.status_code(StatusCode::BAD_REQUEST);
            res.render(Json(ErrorResponse {
                error: "Invalid request body".to_string(),
            }));
            return;
        }
    };

    match flush_one(depot, &body).await {
        Ok(()) => {
            res.status_code(StatusCode::NO_CONTENT);
        }
        Err(e) => render_error(res, &e),
    }
}

/// ## Summary
/// DELETE /api/admin/cache/{user_id} - Drops every cached permission set of a
/// user.
///
/// ## Errors
/// Returns HTTP 400 for a malformed id and HTTP 500 if the cache fails.
#[handler]
pub async fn flush_user(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    match flush_all(req, depot).await {
        Ok(()) => {
            res.status_code(StatusCode::NO_CONTENT);
        }
        Err(e) => render_error(res, &e),
    }
}

async fn flush_one(depot: &Depot, body: &FlushRequest) -> AppResult<()> {
    let engine = get_engine_from_depot(depot)?;
    engine
        .flush_cache(body.user_id, body.tenant_id, body.workspace_id)
        .await?;
    Ok(())
}

async fn flush_all(req: &Request, depot: &Depot) -> AppResult<()> {
    let user_id: UserId = path_param(req, "user_id")?;
    let engine = get_engine_from_depot(depot)?;
    engine.flush_all_for_user(user_id).await?;
    Ok(())
}
