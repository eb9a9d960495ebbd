use salvo::{Depot, Request, Response, handler, http::StatusCode, writing::Json};
use serde::{Deserialize, Serialize};

use crate::depot::{get_actor_from_depot, get_context_from_depot};
use crate::engine_handler::get_engine_from_depot;
use crate::error::{AppError, AppResult, ErrorResponse, render_error};
use warden_service::authz::{AuthorizationRequest, PermissionRequirement};

/// ## Summary
/// Check request payload
#[derive(Debug, Deserialize)]
pub struct CheckRequest {
    pub method: String,
    pub path: String,
    /// Checked instead of the policy rule table when present.
    #[serde(default)]
    pub requirement: Option<PermissionRequirement>,
}

/// ## Summary
/// Check response payload. The reason behind a deny is never disclosed.
#[derive(Debug, Serialize)]
pub struct CheckResponse {
    pub allowed: bool,
}

/// ## Summary
/// POST /api/authz/check - Decides whether the caller may perform the
/// described request.
///
/// The caller and context come from the identity headers.
///
/// ## Errors
/// Returns HTTP 400 for a malformed body, HTTP 401 without an actor, and HTTP
/// 500 if the engine fails.
#[handler]
pub async fn check(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let body: CheckRequest = match req.parse_json().await {
        Ok(body) => body,
        Err(e) => {
            tracing::debug!(error = %e, "Failed to parse check request");
            res.status_code(StatusCode::BAD_REQUEST);
            res.render(Json(ErrorResponse {
                error: "Invalid request body".to_string(),
            }));
            return;
        }
    };

    match decide(depot, body).await {
        Ok(allowed) => res.render(Json(CheckResponse { allowed })),
        Err(e) => render_error(res, &e),
    }
}

async fn decide(depot: &Depot, body: CheckRequest) -> AppResult<bool> {
    let engine = get_engine_from_depot(depot)?;
    let actor = get_actor_from_depot(depot)?;
    let context = get_context_from_depot(depot);

    let mut request = AuthorizationRequest::new(body.method.to_ascii_uppercase(), body.path)
        .with_actor(actor.clone())
        .with_tenant(context.tenant_id)
        .with_workspace(context.workspace_id);
    if let Some(requirement) = body.requirement {
        request = request.with_requirement(requirement);
    }

    let decision = engine.authorize(&request).await.map_err(AppError::from)?;
    Ok(decision.is_allowed())
}
