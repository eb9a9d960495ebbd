//! Subjects of authorization decisions.
//!
//! The engine only ever reads an actor's id and global role, and a membership's
//! workspace role. Everything else about users belongs to the identity layer.

use serde::Serialize;
use warden_core::types::{UserId, WorkspaceId};
use warden_db::model::{actor::ActorRow, membership::MembershipRow};

use super::role::Role;

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Actor {
    pub id: UserId,
    /// Global role.
    pub role: Role,
}

impl Actor {
    #[must_use]
    pub const fn new(id: UserId, role: Role) -> Self {
        Self { id, role }
    }

    #[must_use]
    pub const fn is_owner(&self) -> bool {
        self.role.is_owner()
    }
}

impl From<ActorRow> for Actor {
    fn from(row: ActorRow) -> Self {
        Self::new(UserId::new(row.id), Role::from(row.role))
    }
}

/// The role a user holds inside one workspace. At most one per
/// `(user_id, workspace_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkspaceMembership {
    pub user_id: UserId,
    pub workspace_id: WorkspaceId,
    pub role: Role,
}

impl WorkspaceMembership {
    #[must_use]
    pub const fn new(user_id: UserId, workspace_id: WorkspaceId, role: Role) -> Self {
        Self {
            user_id,
            workspace_id,
            role,
        }
    }
}

impl From<MembershipRow> for WorkspaceMembership {
    fn from(row: MembershipRow) -> Self {
        Self::new(
            UserId::new(row.user_id),
            WorkspaceId::new(row.workspace_id),
            Role::from(row.role),
        )
    }
}
