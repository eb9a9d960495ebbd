//! In-process store backed by `DashMap`.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::Mutex;
use warden_core::types::{UserId, WorkspaceId};

use super::{ActorDirectory, ActorProvisioner, AuditStore, MembershipDirectory, RoleStore};
use crate::authz::assign::RoleAssignment;
use crate::authz::audit::AuditEntry;
use crate::authz::role::Role;
use crate::authz::subject::{Actor, WorkspaceMembership};
use crate::error::{ServiceError, ServiceResult};

/// Actors, memberships and the audit log held in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    actors: DashMap<UserId, Role>,
    memberships: DashMap<(UserId, WorkspaceId), Role>,
    audit_log: Mutex<Vec<AuditEntry>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Provisions (or replaces) an actor.
    pub fn insert_actor(&self, id: UserId, role: Role) {
        self.actors.insert(id, role);
    }

    /// Creates (or replaces) a membership.
    pub fn insert_membership(&self, user_id: UserId, workspace_id: WorkspaceId, role: Role) {
        self.memberships.insert((user_id, workspace_id), role);
    }

    /// Snapshot of every audit entry appended so far.
    pub async fn audit_entries(&self) -> Vec<AuditEntry> {
        self.audit_log.lock().await.clone()
    }
}

#[async_trait]
impl ActorProvisioner for MemoryStore {
    async fn provision_actor(&self, id: UserId, role: &Role) -> ServiceResult<bool> {
        match self.actors.entry(id) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(entry) => {
                entry.insert(role.clone());
                Ok(true)
            }
        }
    }
}

#[async_trait]
impl ActorDirectory for MemoryStore {
    async fn find_actor(&self, id: UserId) -> ServiceResult<Option<Actor>> {
        Ok(self
            .actors
            .get(&id)
            .map(|role| Actor::new(id, role.value().clone())))
    }
}

#[async_trait]
impl MembershipDirectory for MemoryStore {
    async fn find_membership(
        &self,
        user_id: UserId,
        workspace_id: WorkspaceId,
    ) -> ServiceResult<Option<WorkspaceMembership>> {
        Ok(self
            .memberships
            .get(&(user_id, workspace_id))
            .map(|role| WorkspaceMembership::new(user_id, workspace_id, role.value().clone())))
    }
}

#[async_trait]
impl RoleStore for MemoryStore {
    async fn apply_assignment(&self, assignment: &RoleAssignment) -> ServiceResult<()> {
        let target = assignment.target_user_id;

        // Holding the actor entry serializes concurrent assignments to one user.
        let Some(mut actor_role) = self.actors.get_mut(&target) else {
            return Err(ServiceError::ActorNotFound(target));
        };

        if let (Some(workspace_id), Some(role)) =
            (assignment.workspace_id, assignment.workspace_role.as_ref())
        {
            self.memberships.insert((target, workspace_id), role.clone());
        }
        if let Some(role) = &assignment.global_role {
            *actor_role = role.clone();
        }
        Ok(())
    }

    async fn remove_membership(
        &self,
        user_id: UserId,
        workspace_id: WorkspaceId,
    ) -> ServiceResult<bool> {
        Ok(self.memberships.remove(&(user_id, workspace_id)).is_some())
    }
}

#[async_trait]
impl AuditStore for MemoryStore {
    async fn append(&self, entry: AuditEntry) -> ServiceResult<()> {
        self.audit_log.lock().await.push(entry);
        Ok(())
    }
}
