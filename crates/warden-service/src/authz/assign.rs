//! Role assignment.
//!
//! An assignment is committed to the role store first, then audited, then the
//! target's cache entries are dropped. Invalidating only after the commit keeps
//! a racing reader from repopulating the cache with the old role.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use warden_core::types::{UserId, WorkspaceId};

use super::audit::{AuditSink, RoleChangeRecord};
use super::cache::PermissionCache;
use super::role::Role;
use super::store::{ActorDirectory, RoleStore};
use super::subject::Actor;
use crate::error::{ServiceError, ServiceResult};

/// A change to a user's global role, workspace role, or both.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RoleAssignment {
    pub target_user_id: UserId,
    #[serde(default)]
    pub global_role: Option<Role>,
    #[serde(default)]
    pub workspace_role: Option<Role>,
    #[serde(default)]
    pub workspace_id: Option<WorkspaceId>,
}

impl RoleAssignment {
    #[must_use]
    pub const fn global(target_user_id: UserId, role: Role) -> Self {
        Self {
            target_user_id,
            global_role: Some(role),
            workspace_role: None,
            workspace_id: None,
        }
    }

    #[must_use]
    pub const fn workspace(target_user_id: UserId, workspace_id: WorkspaceId, role: Role) -> Self {
        Self {
            target_user_id,
            global_role: None,
            workspace_role: Some(role),
            workspace_id: Some(workspace_id),
        }
    }

    /// ## Summary
    /// Checks the assignment is well formed.
    ///
    /// ## Errors
    /// Returns `ValidationError` when nothing would change, when a workspace
    /// role and workspace id do not come together, when a role is not part of
    /// the vocabulary, or when OWNER is given as a workspace role.
    pub fn validate(&self) -> ServiceResult<()> {
        if self.global_role.is_none() && self.workspace_role.is_none() {
            return Err(ServiceError::ValidationError(
                "assignment must set a global role or a workspace role".to_string(),
            ));
        }
        if self.workspace_role.is_some() != self.workspace_id.is_some() {
            return Err(ServiceError::ValidationError(
                "workspace_role and workspace_id must be given together".to_string(),
            ));
        }
        for role in self.global_role.iter().chain(&self.workspace_role) {
            if !role.is_recognized() {
                return Err(ServiceError::ValidationError(format!("unknown role {role}")));
            }
        }
        if self.workspace_role.as_ref().is_some_and(Role::is_owner) {
            return Err(ServiceError::ValidationError(
                "OWNER cannot be assigned as a workspace role".to_string(),
            ));
        }
        Ok(())
    }
}

/// Applies role changes and keeps the permission cache consistent with them.
#[derive(Clone)]
pub struct RoleAssigner {
    roles: Arc<dyn RoleStore>,
    actors: Arc<dyn ActorDirectory>,
    cache: Arc<PermissionCache>,
    audit: AuditSink,
}

impl RoleAssigner {
    #[must_use]
    pub fn new(
        roles: Arc<dyn RoleStore>,
        actors: Arc<dyn ActorDirectory>,
        cache: Arc<PermissionCache>,
        audit: AuditSink,
    ) -> Self {
        Self {
            roles,
            actors,
            cache,
            audit,
        }
    }

    /// ## Summary
    /// Applies `assignment` on behalf of `by`, then invalidates every cache
    /// entry of the target.
    ///
    /// ## Errors
    /// Returns `ValidationError` for malformed assignments, `AuthorizationError`
    /// when a non-owner grants OWNER or changes the global role of an owner,
    /// `ActorNotFound` for an unknown target, or the store/cache error.
    #[tracing::instrument(skip(self, by, assignment), fields(
        by = %by.id,
        target = %assignment.target_user_id
    ))]
    pub async fn assign(&self, by: &Actor, assignment: RoleAssignment) -> ServiceResult<()> {
        assignment.validate()?;
        if assignment.global_role.is_some() && !by.is_owner() {
            self.ensure_not_owner_change(&assignment).await?;
        }

        self.roles.apply_assignment(&assignment).await?;

        let timestamp = Utc::now();
        if let Some(role) = &assignment.global_role {
            self.audit
                .record_role_change(RoleChangeRecord {
                    actor_id: by.id,
                    subject_id: assignment.target_user_id,
                    new_role: Some(role.clone()),
                    workspace_id: None,
                    timestamp,
                })
                .await;
        }
        if let Some(role) = &assignment.workspace_role {
            self.audit
                .record_role_change(RoleChangeRecord {
                    actor_id: by.id,
                    subject_id: assignment.target_user_id,
                    new_role: Some(role.clone()),
                    workspace_id: assignment.workspace_id,
                    timestamp,
                })
                .await;
        }

        // The tenant of each cached derivation is unknown here, so a membership
        // change drops every entry of the user as well.
        self.cache.invalidate_all(assignment.target_user_id).await?;
        tracing::info!(
            global_role = ?assignment.global_role,
            workspace_role = ?assignment.workspace_role,
            workspace_id = ?assignment.workspace_id,
            "Role assignment applied"
        );
        Ok(())
    }

    async fn ensure_not_owner_change(&self, assignment: &RoleAssignment) -> ServiceResult<()> {
        if assignment.global_role.as_ref().is_some_and(Role::is_owner) {
            return Err(ServiceError::AuthorizationError(
                "only an owner can grant OWNER".to_string(),
            ));
        }
        let target = self.actors.find_actor(assignment.target_user_id).await?;
        if target.as_ref().is_some_and(Actor::is_owner) {
            return Err(ServiceError::AuthorizationError(
                "only an owner can change the role of an owner".to_string(),
            ));
        }
        Ok(())
    }

    /// ## Summary
    /// Ends the membership of `user_id` in `workspace_id`.
    ///
    /// ## Returns
    /// `false` if there was no membership to end.
    ///
    /// ## Errors
    /// Returns the store or cache error.
    #[tracing::instrument(skip(self, by), fields(by = %by.id))]
    pub async fn revoke_membership(
        &self,
        by: &Actor,
        user_id: UserId,
        workspace_id: WorkspaceId,
    ) -> ServiceResult<bool> {
        let removed = self.roles.remove_membership(user_id, workspace_id).await?;
        if !removed {
            return Ok(false);
        }

        self.audit
            .record_role_change(RoleChangeRecord {
                actor_id: by.id,
                subject_id: user_id,
                new_role: None,
                workspace_id: Some(workspace_id),
                timestamp: Utc::now(),
            })
            .await;
        self.cache.invalidate_all(user_id).await?;
        tracing::info!("Workspace membership revoked");
        Ok(true)
    }
}

impl std::fmt::Debug for RoleAssigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoleAssigner")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}
