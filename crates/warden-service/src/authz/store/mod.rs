//! Seams between the engine and the system of record.
//!
//! The engine reads actors and memberships through the directory traits,
//! persists role changes through [`RoleStore`] and appends audit entries
//! through [`AuditStore`]. `memory` backs tests and single-node setups;
//! `postgres` backs production.

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use warden_core::config::SeedActor;
use warden_core::types::{UserId, WorkspaceId};

use super::assign::RoleAssignment;
use super::audit::AuditEntry;
use super::role::Role;
use super::subject::{Actor, WorkspaceMembership};
use crate::error::{ServiceError, ServiceResult};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Actor lookup (id → global role).
#[async_trait]
pub trait ActorDirectory: Send + Sync {
    /// Returns `None` for unknown actors.
    async fn find_actor(&self, id: UserId) -> ServiceResult<Option<Actor>>;
}

/// Workspace membership lookup.
#[async_trait]
pub trait MembershipDirectory: Send + Sync {
    async fn find_membership(
        &self,
        user_id: UserId,
        workspace_id: WorkspaceId,
    ) -> ServiceResult<Option<WorkspaceMembership>>;
}

/// Persists role and membership mutations.
#[async_trait]
pub trait RoleStore: Send + Sync {
    /// Applies every change in `assignment` atomically. Returns once the change
    /// is committed.
    ///
    /// Fails with `ActorNotFound` if the target does not exist.
    async fn apply_assignment(&self, assignment: &RoleAssignment) -> ServiceResult<()>;

    /// Ends a membership. Returns `false` if there was none.
    async fn remove_membership(
        &self,
        user_id: UserId,
        workspace_id: WorkspaceId,
    ) -> ServiceResult<bool>;
}

/// Creates actors at startup.
#[async_trait]
pub trait ActorProvisioner: Send + Sync {
    /// Creates the actor unless the id is taken. Returns `false` if it was.
    async fn provision_actor(&self, id: UserId, role: &Role) -> ServiceResult<bool>;
}

/// ## Summary
/// Provisions the configured seed actors. Existing actors keep their role.
///
/// ## Returns
/// The number of actors created.
///
/// ## Errors
/// Returns `InvalidConfiguration` for a role outside the vocabulary (before
/// anything is written), or the store error.
#[tracing::instrument(skip_all, fields(seeds = seeds.len()))]
pub async fn seed_actors(
    provisioner: &dyn ActorProvisioner,
    seeds: &[SeedActor],
) -> ServiceResult<usize> {
    let seeds = seeds
        .iter()
        .map(|seed| {
            let role = Role::parse(&seed.role);
            if role.is_recognized() {
                Ok((UserId::new(seed.id), role))
            } else {
                Err(ServiceError::InvalidConfiguration(format!(
                    "seed actor {} has unknown role {}",
                    seed.id, seed.role
                )))
            }
        })
        .collect::<ServiceResult<Vec<_>>>()?;

    let mut created = 0;
    for (id, role) in &seeds {
        if provisioner.provision_actor(*id, role).await? {
            created += 1;
        } else {
            tracing::debug!(%id, "Seed actor already exists; keeping its role");
        }
    }
    Ok(created)
}

/// Append-only audit persistence.
#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn append(&self, entry: AuditEntry) -> ServiceResult<()>;
}

/// The storage seams the engine is wired with.
#[derive(Clone)]
pub struct Stores {
    pub actors: Arc<dyn ActorDirectory>,
    pub memberships: Arc<dyn MembershipDirectory>,
    pub roles: Arc<dyn RoleStore>,
    pub audit: Arc<dyn AuditStore>,
}

impl Stores {
    /// Wires every seam to one backend.
    #[must_use]
    pub fn from_backend<S>(backend: Arc<S>) -> Self
    where
        S: ActorDirectory + MembershipDirectory + RoleStore + AuditStore + 'static,
    {
        Self {
            actors: backend.clone(),
            memberships: backend.clone(),
            roles: backend.clone(),
            audit: backend,
        }
    }
}

impl std::fmt::Debug for Stores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stores").finish_non_exhaustive()
    }
}
