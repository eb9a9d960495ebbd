//! Effective permission resolution.
//!
//! ## Algorithm
//!
//! 1. An OWNER resolves to the universal grant without touching the matrix.
//! 2. The global role contributes its global and tenant triples.
//! 3. With a workspace id, the membership role for that workspace contributes
//!    all of its triples. No membership contributes nothing.
//! 4. Both lists are merged first-write-wins on `(scope, resource, action)`.
//!
//! Workspace-scoped triples come only from a membership, so a global role can
//! never open a workspace the actor does not belong to. No filtering against
//! the requested scope happens here; that is the guard's job.

use std::sync::Arc;

use warden_core::types::{TenantId, UserId, WorkspaceId};

use super::matrix::RoleMatrix;
use super::permission::{PermissionSet, PermissionTriple, Scope};
use super::store::{ActorDirectory, MembershipDirectory};
use crate::error::{ServiceError, ServiceResult};

#[derive(Clone)]
pub struct PermissionResolver {
    matrix: Arc<RoleMatrix>,
    actors: Arc<dyn ActorDirectory>,
    memberships: Arc<dyn MembershipDirectory>,
}

impl PermissionResolver {
    #[must_use]
    pub fn new(
        matrix: Arc<RoleMatrix>,
        actors: Arc<dyn ActorDirectory>,
        memberships: Arc<dyn MembershipDirectory>,
    ) -> Self {
        Self {
            matrix,
            actors,
            memberships,
        }
    }

    #[must_use]
    pub fn matrix(&self) -> &RoleMatrix {
        &self.matrix
    }

    /// ## Summary
    /// Computes the effective permissions of `user_id` in the given context.
    ///
    /// ## Errors
    /// Returns `ActorNotFound` for unknown users, or the store error when a
    /// lookup fails.
    #[tracing::instrument(skip(self))]
    pub async fn resolve(
        &self,
        user_id: UserId,
        tenant_id: Option<TenantId>,
        workspace_id: Option<WorkspaceId>,
    ) -> ServiceResult<PermissionSet> {
        let actor = self
            .actors
            .find_actor(user_id)
            .await?
            .ok_or(ServiceError::ActorNotFound(user_id))?;

        if actor.is_owner() {
            return Ok(PermissionSet::universal());
        }

        let base: Vec<PermissionTriple> = self
            .matrix
            .lookup(&actor.role)
            .iter()
            .filter(|triple| triple.scope() != Scope::Workspace)
            .cloned()
            .collect();

        let workspace = match workspace_id {
            Some(workspace_id) => self
                .memberships
                .find_membership(user_id, workspace_id)
                .await?
                .map_or(&[][..], |membership| self.matrix.lookup(&membership.role)),
            None => &[],
        };

        let permissions = PermissionSet::merge(&base, workspace);
        tracing::trace!(
            role = %actor.role,
            count = permissions.len(),
            "Resolved effective permissions"
        );
        Ok(permissions)
    }
}

impl std::fmt::Debug for PermissionResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionResolver")
            .field("matrix", &self.matrix)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authz::role::Role;
    use crate::authz::store::MemoryStore;
    use crate::authz::test_support::{CountingStore, builtin_matrix};

    const USER: UserId = UserId::new(1);
    const TENANT: TenantId = TenantId::new(10);
    const WORKSPACE: WorkspaceId = WorkspaceId::new(7);

    async fn resolver_with(store: Arc<MemoryStore>) -> PermissionResolver {
        PermissionResolver::new(Arc::new(builtin_matrix().await), store.clone(), store)
    }

    #[test_log::test(tokio::test)]
    async fn unknown_actor_is_not_found() {
        let resolver = resolver_with(Arc::new(MemoryStore::new())).await;
        let err = resolver
            .resolve(USER, None, None)
            .await
            .expect_err("unknown actor");
        assert!(matches!(err, ServiceError::ActorNotFound(id) if id == USER));
    }

    #[test_log::test(tokio::test)]
    async fn owner_short_circuits_before_membership_lookup() {
        let store = Arc::new(CountingStore::default());
        store.inner.insert_actor(USER, Role::Owner);
        let resolver = PermissionResolver::new(
            Arc::new(RoleMatrix::default()),
            store.clone(),
            store.clone(),
        );

        let permissions = resolver
            .resolve(USER, Some(TENANT), Some(WORKSPACE))
            .await
            .expect("resolves");
        assert_eq!(permissions, PermissionSet::universal());
        assert_eq!(store.membership_lookups(), 0);
    }

    #[test_log::test(tokio::test)]
    async fn global_role_without_membership_has_no_workspace_triples() {
        let store = Arc::new(MemoryStore::new());
        store.insert_actor(USER, Role::Author);
        let resolver = resolver_with(store).await;

        let permissions = resolver
            .resolve(USER, Some(TENANT), Some(WORKSPACE))
            .await
            .expect("resolves");
        assert!(permissions.iter().all(|t| t.scope() != Scope::Workspace));
        assert!(permissions.contains(&PermissionTriple::new("notifications", "read", Scope::Global)));
    }

    #[test_log::test(tokio::test)]
    async fn membership_role_adds_workspace_triples() {
        let store = Arc::new(MemoryStore::new());
        store.insert_actor(USER, Role::Viewer);
        store.insert_membership(USER, WORKSPACE, Role::Editor);
        let resolver = resolver_with(store).await;

        let permissions = resolver
            .resolve(USER, Some(TENANT), Some(WORKSPACE))
            .await
            .expect("resolves");
        assert!(permissions.contains(&PermissionTriple::new("articles", "*", Scope::Workspace)));
        assert!(permissions.contains(&PermissionTriple::new("queues", "read", Scope::Tenant)));

        let elsewhere = resolver
            .resolve(USER, Some(TENANT), Some(WorkspaceId::new(8)))
            .await
            .expect("resolves");
        assert!(elsewhere.is_empty());
    }

    #[test_log::test(tokio::test)]
    async fn membership_is_ignored_without_workspace_context() {
        let store = Arc::new(MemoryStore::new());
        store.insert_actor(USER, Role::Member);
        store.insert_membership(USER, WORKSPACE, Role::Admin);
        let resolver = resolver_with(store).await;

        let permissions = resolver
            .resolve(USER, Some(TENANT), None)
            .await
            .expect("resolves");
        assert_eq!(
            permissions.as_slice(),
            &[PermissionTriple::new("notifications", "read", Scope::Global)]
        );
    }

    #[test_log::test(tokio::test)]
    async fn workspace_owner_membership_grants_nothing() {
        let store = Arc::new(MemoryStore::new());
        store.insert_actor(USER, Role::Viewer);
        store.insert_membership(USER, WORKSPACE, Role::Owner);
        let resolver = resolver_with(store).await;

        let permissions = resolver
            .resolve(USER, None, Some(WORKSPACE))
            .await
            .expect("resolves");
        assert!(permissions.is_empty());
    }
}
