//! Decision point.
//!
//! Answers allow/deny for one request. The requirement is either declared by
//! the call site or looked up in the policy rule table by method and path.
//! Owners are always allowed. Everyone else is matched against their cached
//! effective permissions. Only allows are audited, and the reason for a deny is
//! logged but never returned to the client.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use warden_core::config::UnmatchedRoutePolicy;
use warden_core::types::{TenantId, WorkspaceId};

use super::audit::{AuditRecord, AuditSink};
use super::cache::{CacheKey, PermissionCache};
use super::permission::{PermissionRequirement, ScopedRequirement};
use super::policy::PolicyRuleTable;
use super::subject::Actor;
use crate::error::{ServiceError, ServiceResult};

/// Generic message for every deny.
pub const NOT_PERMITTED: &str = "Not permitted";

/// Everything the decision point needs to know about a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorizationRequest {
    pub actor: Option<Actor>,
    /// Declared by the call site. When absent the policy rule table decides.
    pub requirement: Option<PermissionRequirement>,
    pub method: String,
    pub path: String,
    pub tenant_id: Option<TenantId>,
    pub workspace_id: Option<WorkspaceId>,
}

impl AuthorizationRequest {
    #[must_use]
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_actor(mut self, actor: Actor) -> Self {
        self.actor = Some(actor);
        self
    }

    #[must_use]
    pub fn with_requirement(mut self, requirement: PermissionRequirement) -> Self {
        self.requirement = Some(requirement);
        self
    }

    #[must_use]
    pub const fn with_tenant(mut self, tenant_id: Option<TenantId>) -> Self {
        self.tenant_id = tenant_id;
        self
    }

    #[must_use]
    pub const fn with_workspace(mut self, workspace_id: Option<WorkspaceId>) -> Self {
        self.workspace_id = workspace_id;
        self
    }
}

/// Why a decision came out the way it did. For logs only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    Owner,
    Granted,
    UnmatchedRouteAllowed,
    UnmatchedRouteDenied,
    NoMatchingPermission,
    ActorNotFound,
    ResolutionFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    allowed: bool,
    reason: DecisionReason,
}

impl Decision {
    #[must_use]
    pub const fn allow(reason: DecisionReason) -> Self {
        Self {
            allowed: true,
            reason,
        }
    }

    #[must_use]
    pub const fn deny(reason: DecisionReason) -> Self {
        Self {
            allowed: false,
            reason,
        }
    }

    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        self.allowed
    }

    #[must_use]
    pub const fn reason(&self) -> DecisionReason {
        self.reason
    }

    /// ## Summary
    /// Converts a deny into an error carrying the generic message.
    ///
    /// ## Errors
    /// Returns `AuthorizationError` when the decision is a deny.
    pub fn require(self) -> ServiceResult<()> {
        if self.allowed {
            Ok(())
        } else {
            Err(ServiceError::AuthorizationError(NOT_PERMITTED.to_string()))
        }
    }
}

/// The decision point.
#[derive(Debug, Clone)]
pub struct Guard {
    rules: Arc<PolicyRuleTable>,
    cache: Arc<PermissionCache>,
    audit: AuditSink,
    unmatched: UnmatchedRoutePolicy,
}

impl Guard {
    #[must_use]
    pub const fn new(
        rules: Arc<PolicyRuleTable>,
        cache: Arc<PermissionCache>,
        audit: AuditSink,
        unmatched: UnmatchedRoutePolicy,
    ) -> Self {
        Self {
            rules,
            cache,
            audit,
            unmatched,
        }
    }

    /// ## Summary
    /// Decides whether `request` may proceed.
    ///
    /// ## Errors
    /// Returns `NotAuthenticated` if the request carries no actor. Every other
    /// failure is folded into a deny.
    #[tracing::instrument(skip(self, request), fields(
        method = %request.method,
        path = %request.path,
        tenant_id = ?request.tenant_id,
        workspace_id = ?request.workspace_id
    ))]
    pub async fn check(&self, request: &AuthorizationRequest) -> ServiceResult<Decision> {
        let actor = request.actor.as_ref().ok_or(ServiceError::NotAuthenticated)?;

        let requirement = match &request.requirement {
            Some(requirement) => Some(requirement.scoped(request.tenant_id, request.workspace_id)),
            None => self
                .rules
                .find(&request.method, &request.path)
                .map(|rule| rule.requirement().scoped(request.tenant_id, request.workspace_id)),
        };

        if actor.is_owner() {
            if let Some(requirement) = &requirement {
                self.record_allowed(actor, requirement, request);
            }
            tracing::debug!(user_id = %actor.id, "Owner allowed");
            return Ok(Decision::allow(DecisionReason::Owner));
        }

        let Some(requirement) = requirement else {
            return Ok(self.unmatched_route(actor));
        };

        let key = CacheKey::new(actor.id, request.tenant_id, request.workspace_id);
        let decision = match self.cache.get_or_resolve(key).await {
            Ok(permissions) if permissions.allows(&requirement) => {
                self.record_allowed(actor, &requirement, request);
                Decision::allow(DecisionReason::Granted)
            }
            Ok(_) => Decision::deny(DecisionReason::NoMatchingPermission),
            Err(ServiceError::ActorNotFound(_)) => Decision::deny(DecisionReason::ActorNotFound),
            Err(error) => {
                tracing::warn!(%error, user_id = %actor.id, "Failed to resolve permissions");
                Decision::deny(DecisionReason::ResolutionFailed)
            }
        };

        if decision.is_allowed() {
            tracing::debug!(user_id = %actor.id, %requirement, "Allowed");
        } else {
            tracing::info!(
                user_id = %actor.id,
                %requirement,
                reason = ?decision.reason(),
                "Denied"
            );
        }
        Ok(decision)
    }

    fn unmatched_route(&self, actor: &Actor) -> Decision {
        match self.unmatched {
            UnmatchedRoutePolicy::Allow => {
                tracing::debug!(user_id = %actor.id, "No policy rule matched; allowing");
                Decision::allow(DecisionReason::UnmatchedRouteAllowed)
            }
            UnmatchedRoutePolicy::Deny => {
                tracing::info!(user_id = %actor.id, "No policy rule matched; denying");
                Decision::deny(DecisionReason::UnmatchedRouteDenied)
            }
        }
    }

    fn record_allowed(
        &self,
        actor: &Actor,
        requirement: &ScopedRequirement,
        request: &AuthorizationRequest,
    ) {
        self.audit.record_allowed(AuditRecord {
            actor_id: actor.id,
            tenant_id: request.tenant_id,
            workspace_id: request.workspace_id,
            resource: requirement.resource.clone(),
            action: requirement.action.clone(),
            scope: requirement.scope,
            timestamp: Utc::now(),
            request_method: non_empty(&request.method),
            request_path: non_empty(&request.path),
        });
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}
