//! Authorization service facade.
//!
//! This is the surface the rest of the system calls: authorize a request,
//! assign roles, flush cache entries and inspect effective permissions.

use std::sync::Arc;
use std::time::Duration;

use warden_core::config::{AuthzConfig, UnmatchedRoutePolicy};
use warden_core::types::{TenantId, UserId, WorkspaceId};

use super::assign::{RoleAssigner, RoleAssignment};
use super::audit::AuditSink;
use super::cache::{CacheKey, DEFAULT_TTL, MemoryCacheStore, PermissionCache, PermissionCacheStore};
use super::guard::{AuthorizationRequest, Decision, Guard};
use super::matrix::RoleMatrix;
use super::permission::PermissionSet;
use super::policy::PolicyRuleTable;
use super::resolver::PermissionResolver;
use super::store::{ActorDirectory, Stores};
use super::subject::Actor;
use crate::error::{ServiceError, ServiceResult};

/// Tunables of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    pub cache_ttl: Duration,
    pub cache_capacity: usize,
    pub audit_capacity: usize,
    pub unmatched: UnmatchedRoutePolicy,
}

impl EngineOptions {
    fn with_ttl(config: &AuthzConfig, cache_ttl: Duration) -> Self {
        Self {
            cache_ttl,
            cache_capacity: config.cache_capacity,
            audit_capacity: config.audit_channel_capacity,
            unmatched: config.unmatched_route,
        }
    }
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self::with_ttl(&AuthzConfig::default(), DEFAULT_TTL)
    }
}

impl TryFrom<&AuthzConfig> for EngineOptions {
    type Error = ServiceError;

    fn try_from(config: &AuthzConfig) -> ServiceResult<Self> {
        if config.cache_ttl_seconds == 0 {
            return Err(ServiceError::InvalidConfiguration(
                "authz.cache_ttl_seconds must be at least 1".to_string(),
            ));
        }
        Ok(Self::with_ttl(
            config,
            Duration::from_secs(config.cache_ttl_seconds),
        ))
    }
}

/// The authorization engine. Share it behind an `Arc`.
pub struct AuthorizationService {
    guard: Guard,
    cache: Arc<PermissionCache>,
    assigner: RoleAssigner,
    actors: Arc<dyn ActorDirectory>,
}

impl std::fmt::Debug for AuthorizationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizationService")
            .field("guard", &self.guard)
            .field("cache", &self.cache)
            .field("assigner", &self.assigner)
            .finish_non_exhaustive()
    }
}

impl AuthorizationService {
    /// ## Summary
    /// Wires the engine with an in-process permission cache.
    ///
    /// Spawns the audit worker, so this must run inside a Tokio runtime.
    #[must_use]
    pub fn new(
        matrix: RoleMatrix,
        rules: PolicyRuleTable,
        stores: Stores,
        options: EngineOptions,
    ) -> Self {
        let cache_store = Arc::new(MemoryCacheStore::new(options.cache_capacity));
        Self::with_cache_store(matrix, rules, stores, cache_store, options)
    }

    /// ## Summary
    /// Wires the engine with the given permission cache store.
    ///
    /// Spawns the audit worker, so this must run inside a Tokio runtime.
    #[must_use]
    pub fn with_cache_store(
        matrix: RoleMatrix,
        rules: PolicyRuleTable,
        stores: Stores,
        cache_store: Arc<dyn PermissionCacheStore>,
        options: EngineOptions,
    ) -> Self {
        let resolver = PermissionResolver::new(
            Arc::new(matrix),
            stores.actors.clone(),
            stores.memberships.clone(),
        );
        let cache = Arc::new(PermissionCache::new(cache_store, resolver, options.cache_ttl));
        let (audit, _worker) = AuditSink::spawn(stores.audit.clone(), options.audit_capacity);

        let guard = Guard::new(
            Arc::new(rules),
            cache.clone(),
            audit.clone(),
            options.unmatched,
        );
        let assigner = RoleAssigner::new(
            stores.roles,
            stores.actors.clone(),
            cache.clone(),
            audit,
        );

        Self {
            guard,
            cache,
            assigner,
            actors: stores.actors,
        }
    }

    /// ## Summary
    /// Builds the engine from configuration: loads the role matrix (file or
    /// built-in) and the policy rule table (configured or built-in).
    ///
    /// ## Errors
    /// Returns `InvalidConfiguration` for a zero cache TTL. Returns
    /// `InvalidConfiguration`, Casbin or I/O errors if the matrix or rules
    /// cannot be loaded.
    #[tracing::instrument(skip(config, stores))]
    pub async fn from_config(config: &AuthzConfig, stores: Stores) -> ServiceResult<Self> {
        let options = EngineOptions::try_from(config)?;
        let matrix = RoleMatrix::load(config.role_matrix_path.as_deref()).await?;
        let rules = match &config.policy_rules {
            Some(rules) => PolicyRuleTable::from_config(rules)?,
            None => PolicyRuleTable::builtin()?,
        };
        tracing::info!(
            policy_rules = rules.len(),
            unmatched_route = ?config.unmatched_route,
            cache_ttl_seconds = config.cache_ttl_seconds,
            "Authorization engine configured"
        );
        Ok(Self::new(matrix, rules, stores, options))
    }

    /// ## Summary
    /// Looks up the actor behind an identity asserted by the caller.
    ///
    /// ## Errors
    /// Returns the directory error.
    pub async fn find_actor(&self, user_id: UserId) -> ServiceResult<Option<Actor>> {
        self.actors.find_actor(user_id).await
    }

    /// ## Summary
    /// Decides whether a request may proceed.
    ///
    /// ## Errors
    /// Returns `NotAuthenticated` when the request has no actor.
    pub async fn authorize(&self, request: &AuthorizationRequest) -> ServiceResult<Decision> {
        self.guard.check(request).await
    }

    /// ## Summary
    /// Applies a role assignment and invalidates the target's cache entries.
    ///
    /// ## Errors
    /// See [`RoleAssigner::assign`].
    pub async fn assign_role(&self, by: &Actor, assignment: RoleAssignment) -> ServiceResult<()> {
        self.assigner.assign(by, assignment).await
    }

    /// ## Summary
    /// Ends a workspace membership and invalidates the user's cache entries.
    ///
    /// ## Errors
    /// See [`RoleAssigner::revoke_membership`].
    pub async fn revoke_membership(
        &self,
        by: &Actor,
        user_id: UserId,
        workspace_id: WorkspaceId,
    ) -> ServiceResult<bool> {
        self.assigner.revoke_membership(by, user_id, workspace_id).await
    }

    /// ## Summary
    /// Drops exactly one cache entry.
    ///
    /// ## Errors
    /// Returns the cache store error.
    pub async fn flush_cache(
        &self,
        user_id: UserId,
        tenant_id: Option<TenantId>,
        workspace_id: Option<WorkspaceId>,
    ) -> ServiceResult<()> {
        self.cache
            .invalidate(CacheKey::new(user_id, tenant_id, workspace_id))
            .await
    }

    /// ## Summary
    /// Drops every cache entry of a user.
    ///
    /// ## Errors
    /// Returns the cache store error.
    pub async fn flush_all_for_user(&self, user_id: UserId) -> ServiceResult<()> {
        self.cache.invalidate_all(user_id).await
    }

    /// ## Summary
    /// Effective permissions of a user in a context, through the cache.
    ///
    /// ## Errors
    /// Returns `ActorNotFound` for unknown users or the store error.
    pub async fn effective_permissions(
        &self,
        user_id: UserId,
        tenant_id: Option<TenantId>,
        workspace_id: Option<WorkspaceId>,
    ) -> ServiceResult<Arc<PermissionSet>> {
        self.cache
            .get_or_resolve(CacheKey::new(user_id, tenant_id, workspace_id))
            .await
    }
}
