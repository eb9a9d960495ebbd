use salvo::async_trait;
use std::sync::Arc;

use crate::error::AppResult;
use warden_core::error::CoreError;
use warden_service::authz::AuthorizationService;

/// Makes the authorization engine available to downstream handlers.
pub struct EngineHandler {
    pub engine: Arc<AuthorizationService>,
}

#[async_trait]
impl salvo::Handler for EngineHandler {
    #[tracing::instrument(skip(self, _req, depot, _res, _ctrl))]
    async fn handle(
        &self,
        _req: &mut salvo::Request,
        depot: &mut salvo::Depot,
        _res: &mut salvo::Response,
        _ctrl: &mut salvo::FlowCtrl,
    ) {
        depot.inject(self.engine.clone());
    }
}

/// ## Summary
/// Retrieves the authorization engine from the depot.
///
/// ## Errors
/// Returns an error if the engine is not found in the depot.
pub fn get_engine_from_depot(depot: &salvo::Depot) -> AppResult<Arc<AuthorizationService>> {
    depot
        .obtain::<Arc<AuthorizationService>>()
        .cloned()
        .map_err(|_err| CoreError::InvariantViolation("Authorization engine not found in depot").into())
}
