//! Decision point middleware.
//!
//! [`AuthorizeMiddleware`] lets the policy rule table pick the requirement
//! from the request method and path. [`RequirePermission`] pins the
//! requirement on the route instead.

use salvo::Depot;
use warden_core::constants::{FORWARDED_METHOD_HEADER, FORWARDED_URI_HEADER};
use warden_service::authz::{AuthorizationRequest, PermissionRequirement, Scope};

use crate::depot::{get_actor_from_depot, get_context_from_depot};
use crate::engine_handler::get_engine_from_depot;
use crate::error::{AppError, render_error};

/// ## Summary
/// Authorizes the request against the policy rule table.
///
/// When a forward-auth proxy sets `X-Forwarded-Method` and `X-Forwarded-Uri`,
/// the forwarded request is checked instead of this one.
///
/// ## Errors
/// Returns HTTP 401 when no actor was identified and HTTP 403 on deny.
pub struct AuthorizeMiddleware;

/// ## Summary
/// Authorizes the request against a requirement declared on the route.
pub struct RequirePermission {
    requirement: PermissionRequirement,
}

impl RequirePermission {
    #[must_use]
    pub fn new(resource: &str, action: &str) -> Self {
        Self {
            requirement: PermissionRequirement::new(resource, action),
        }
    }

    /// Fixes the scope instead of deriving it from the request context.
    #[must_use]
    pub fn with_scope(self, scope: Scope) -> Self {
        Self {
            requirement: self.requirement.with_scope(scope),
        }
    }
}

#[salvo::async_trait]
impl salvo::Handler for AuthorizeMiddleware {
    #[tracing::instrument(skip(self, req, depot, res, ctrl), fields(
        method = %req.method(),
        path = %req.uri().path()
    ))]
    async fn handle(
        &self,
        req: &mut salvo::Request,
        depot: &mut Depot,
        res: &mut salvo::Response,
        ctrl: &mut salvo::FlowCtrl,
    ) {
        let (method, path) = forwarded_target(req);
        authorize(AuthorizationRequest::new(method, path), depot, res, ctrl).await;
    }
}

#[salvo::async_trait]
impl salvo::Handler for RequirePermission {
    #[tracing::instrument(skip(self, req, depot, res, ctrl), fields(
        method = %req.method(),
        path = %req.uri().path(),
        requirement = ?self.requirement
    ))]
    async fn handle(
        &self,
        req: &mut salvo::Request,
        depot: &mut Depot,
        res: &mut salvo::Response,
        ctrl: &mut salvo::FlowCtrl,
    ) {
        let request = AuthorizationRequest::new(req.method().as_str(), req.uri().path())
            .with_requirement(self.requirement.clone());
        authorize(request, depot, res, ctrl).await;
    }
}

/// Method and path of the request being gated.
fn forwarded_target(req: &salvo::Request) -> (String, String) {
    let header = |name: &str| {
        req.headers()
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    };
    match (header(FORWARDED_METHOD_HEADER), header(FORWARDED_URI_HEADER)) {
        (Some(method), Some(uri)) => {
            let path = uri.split_once('?').map_or(uri.as_str(), |(path, _)| path);
            (method.to_ascii_uppercase(), path.to_string())
        }
        _ => (req.method().as_str().to_string(), req.uri().path().to_string()),
    }
}

async fn authorize(
    request: AuthorizationRequest,
    depot: &Depot,
    res: &mut salvo::Response,
    ctrl: &mut salvo::FlowCtrl,
) {
    let engine = match get_engine_from_depot(depot) {
        Ok(engine) => engine,
        Err(e) => {
            render_error(res, &e);
            ctrl.skip_rest();
            return;
        }
    };

    let context = get_context_from_depot(depot);
    let mut request = request
        .with_tenant(context.tenant_id)
        .with_workspace(context.workspace_id);
    if let Ok(actor) = get_actor_from_depot(depot) {
        request = request.with_actor(actor.clone());
    }

    if let Err(e) = engine
        .authorize(&request)
        .await
        .and_then(|decision| decision.require())
    {
        render_error(res, &AppError::from(e));
        ctrl.skip_rest();
    }
}
