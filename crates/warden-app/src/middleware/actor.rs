use std::str::FromStr;

use salvo::Depot;
use warden_core::constants::{ACTOR_ID_HEADER, TENANT_ID_HEADER, WORKSPACE_ID_HEADER};
use warden_core::error::CoreError;
use warden_core::types::UserId;

use crate::depot::{RequestContext, depot_keys};
use crate::engine_handler::get_engine_from_depot;
use crate::error::{AppResult, render_error};

/// ## Summary
/// Identifies the actor behind a request from the headers set by the fronting
/// identity proxy and records the tenant and workspace the request is made in.
///
/// ## Side Effects
/// Inserts the request context into the depot, and the actor when the actor
/// header names a known user. A request without an actor header, or with an
/// unknown actor, continues without one.
///
/// ## Errors
/// Returns an HTTP 400 Bad Request response if an id header is malformed.
pub struct ActorMiddleware;

#[salvo::async_trait]
impl salvo::Handler for ActorMiddleware {
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
        let identity = parse_header::<UserId>(req, ACTOR_ID_HEADER).and_then(|actor_id| {
            let context = RequestContext {
                tenant_id: parse_header(req, TENANT_ID_HEADER)?,
                workspace_id: parse_header(req, WORKSPACE_ID_HEADER)?,
            };
            Ok((actor_id, context))
        });
        let (actor_id, context) = match identity {
            Ok(identity) => identity,
            Err(e) => {
                render_error(res, &e);
                ctrl.skip_rest();
                return;
            }
        };
        depot.insert(depot_keys::REQUEST_CONTEXT, context);

        let Some(actor_id) = actor_id else {
            tracing::trace!("No actor header, continuing anonymously");
            return;
        };

        let engine = match get_engine_from_depot(depot) {
            Ok(engine) => engine,
            Err(e) => {
                render_error(res, &e);
                ctrl.skip_rest();
                return;
            }
        };

        match engine.find_actor(actor_id).await {
            Ok(Some(actor)) => {
                tracing::debug!(actor_id = %actor.id, role = %actor.role, "Actor identified");
                depot.insert(depot_keys::ACTOR, actor);
            }
            Ok(None) => {
                tracing::debug!(%actor_id, "Actor header names an unknown user");
            }
            Err(e) => {
                render_error(res, &e.into());
                ctrl.skip_rest();
            }
        }
    }
}

/// Parses an optional id header. Absent headers are `None`; present but
/// malformed headers are an error.
fn parse_header<T>(req: &salvo::Request, name: &str) -> AppResult<Option<T>>
where
    T: FromStr<Err = CoreError>,
{
    let Some(value) = req.headers().get(name) else {
        return Ok(None);
    };
    let value = value
        .to_str()
        .map_err(|_e| CoreError::ParseError(format!("{name} header is not valid text")))?;
    Ok(Some(value.parse()?))
}
