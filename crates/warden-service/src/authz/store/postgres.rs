//! `PostgreSQL` store backed by `warden-db`.

use async_trait::async_trait;
use diesel_async::scoped_futures::ScopedFutureExt;
use warden_core::types::{UserId, WorkspaceId};
use warden_db::db::DbProvider;
use warden_db::db::connection::DbPool;
use warden_db::db::enums::AuditKind;
use warden_db::db::query;
use warden_db::db::transaction::with_transaction;
use warden_db::error::DbError;
use warden_db::model::actor::NewActor;
use warden_db::model::audit::NewAuditEntry;
use warden_db::model::membership::NewMembership;

use super::{ActorDirectory, ActorProvisioner, AuditStore, MembershipDirectory, RoleStore};
use crate::authz::assign::RoleAssignment;
use crate::authz::audit::AuditEntry;
use crate::authz::role::Role;
use crate::authz::subject::{Actor, WorkspaceMembership};
use crate::error::{ServiceError, ServiceResult};

const OUTCOME_ALLOWED: &str = "allowed";

#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl std::fmt::Debug for PgStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgStore").finish_non_exhaustive()
    }
}

#[async_trait]
impl ActorDirectory for PgStore {
    #[tracing::instrument(skip(self))]
    async fn find_actor(&self, id: UserId) -> ServiceResult<Option<Actor>> {
        let mut conn = self.pool.get_connection().await?;
        let row = query::actor::find_actor(&mut conn, id.get()).await?;
        Ok(row.map(Actor::from))
    }
}

#[async_trait]
impl ActorProvisioner for PgStore {
    #[tracing::instrument(skip(self))]
    async fn provision_actor(&self, id: UserId, role: &Role) -> ServiceResult<bool> {
        let mut conn = self.pool.get_connection().await?;
        let inserted = query::actor::insert_actor(
            &mut conn,
            &NewActor {
                id: id.get(),
                role: role.as_str(),
            },
        )
        .await?;
        Ok(inserted > 0)
    }
}

#[async_trait]
impl MembershipDirectory for PgStore {
    #[tracing::instrument(skip(self))]
    async fn find_membership(
        &self,
        user_id: UserId,
        workspace_id: WorkspaceId,
    ) -> ServiceResult<Option<WorkspaceMembership>> {
        let mut conn = self.pool.get_connection().await?;
        let row =
            query::membership::find_membership(&mut conn, user_id.get(), workspace_id.get())
                .await?;
        Ok(row.map(WorkspaceMembership::from))
    }
}

#[async_trait]
impl RoleStore for PgStore {
    #[tracing::instrument(skip(self, assignment), fields(target = %assignment.target_user_id))]
    async fn apply_assignment(&self, assignment: &RoleAssignment) -> ServiceResult<()> {
        let target = assignment.target_user_id.get();
        let global_role = assignment
            .global_role
            .as_ref()
            .map(|role| role.as_str().to_string());
        let membership = assignment
            .workspace_id
            .zip(assignment.workspace_role.as_ref())
            .map(|(workspace_id, role)| (workspace_id.get(), role.as_str().to_string()));

        let mut conn = self.pool.get_connection().await?;
        let applied = with_transaction(&mut conn, |conn| {
            async move {
                if query::actor::find_actor(conn, target).await?.is_none() {
                    return Ok(false);
                }
                if let Some(role) = &global_role {
                    query::actor::update_actor_role(conn, target, role).await?;
                }
                if let Some((workspace_id, role)) = &membership {
                    let new_membership = NewMembership {
                        user_id: target,
                        workspace_id: *workspace_id,
                        role,
                        updated_at: chrono::Utc::now(),
                    };
                    query::membership::upsert_membership(conn, &new_membership).await?;
                }
                Ok(true)
            }
            .scope_boxed()
        })
        .await?;

        if applied {
            Ok(())
        } else {
            Err(ServiceError::ActorNotFound(assignment.target_user_id))
        }
    }

    #[tracing::instrument(skip(self))]
    async fn remove_membership(
        &self,
        user_id: UserId,
        workspace_id: WorkspaceId,
    ) -> ServiceResult<bool> {
        let mut conn = self.pool.get_connection().await?;
        let deleted =
            query::membership::delete_membership(&mut conn, user_id.get(), workspace_id.get())
                .await?;
        Ok(deleted > 0)
    }
}

#[async_trait]
impl AuditStore for PgStore {
    async fn append(&self, entry: AuditEntry) -> ServiceResult<()> {
        let mut conn = self.pool.get_connection().await.map_err(audit_write_failed)?;
        query::audit::insert_audit_entry(&mut conn, &to_row(entry))
            .await
            .map_err(audit_write_failed)?;
        Ok(())
    }
}

fn audit_write_failed(error: DbError) -> ServiceError {
    ServiceError::AuditWriteFailed(error.to_string())
}

fn to_row(entry: AuditEntry) -> NewAuditEntry {
    match entry {
        AuditEntry::Allowed(record) => NewAuditEntry {
            kind: AuditKind::Allowed,
            actor_id: record.actor_id.get(),
            subject_id: None,
            tenant_id: record.tenant_id.map(|id| id.get()),
            workspace_id: record.workspace_id.map(|id| id.get()),
            resource: Some(record.resource),
            action: Some(record.action),
            outcome: Some(OUTCOME_ALLOWED.to_string()),
            new_role: None,
            request_method: record.request_method,
            request_path: record.request_path,
            created_at: record.timestamp,
        },
        AuditEntry::RoleChange(record) => NewAuditEntry {
            kind: AuditKind::RoleChange,
            actor_id: record.actor_id.get(),
            subject_id: Some(record.subject_id.get()),
            tenant_id: None,
            workspace_id: record.workspace_id.map(|id| id.get()),
            resource: None,
            action: None,
            outcome: None,
            new_role: record.new_role.map(String::from),
            request_method: None,
            request_path: None,
            created_at: record.timestamp,
        },
    }
}
