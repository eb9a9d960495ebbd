//! Audit trail of granted decisions and role changes.
//!
//! Granted decisions are queued on a bounded channel and written by a worker
//! task; the decision path never waits on the write. Role changes are written
//! inline by the assignment operation. In both cases failures are logged and
//! swallowed.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use warden_core::types::{TenantId, UserId, WorkspaceId};

use super::permission::Scope;
use super::role::Role;
use super::store::AuditStore;

/// A granted authorization decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditRecord {
    pub actor_id: UserId,
    pub tenant_id: Option<TenantId>,
    pub workspace_id: Option<WorkspaceId>,
    pub resource: String,
    pub action: String,
    pub scope: Scope,
    pub timestamp: DateTime<Utc>,
    pub request_method: Option<String>,
    pub request_path: Option<String>,
}

/// A global or workspace role assignment, or the end of a membership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleChangeRecord {
    /// Who made the change.
    pub actor_id: UserId,
    /// Whose role changed.
    pub subject_id: UserId,
    /// `None` when a membership ended.
    pub new_role: Option<Role>,
    /// Set for membership changes.
    pub workspace_id: Option<WorkspaceId>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuditEntry {
    Allowed(AuditRecord),
    RoleChange(RoleChangeRecord),
}

/// Handle to the audit worker. Cheap to clone.
#[derive(Clone)]
pub struct AuditSink {
    sender: mpsc::Sender<AuditEntry>,
    store: Arc<dyn AuditStore>,
}

impl AuditSink {
    /// ## Summary
    /// Starts the audit worker writing to `store`, buffering up to `capacity`
    /// pending records. The worker stops once every sink clone is dropped.
    #[must_use]
    pub fn spawn(store: Arc<dyn AuditStore>, capacity: usize) -> (Self, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let handle = tokio::spawn(run_worker(receiver, store.clone()));
        (Self { sender, store }, handle)
    }

    /// Queues a granted decision without waiting. Drops the record if the
    /// queue is full or the worker has stopped.
    pub fn record_allowed(&self, record: AuditRecord) {
        if let Err(error) = self.sender.try_send(AuditEntry::Allowed(record)) {
            tracing::debug!(%error, "Dropping audit record");
        }
    }

    /// Writes a role change and waits for the store.
    #[tracing::instrument(skip(self, record), fields(
        actor_id = %record.actor_id,
        subject_id = %record.subject_id,
        new_role = ?record.new_role
    ))]
    pub async fn record_role_change(&self, record: RoleChangeRecord) {
        if let Err(error) = self.store.append(AuditEntry::RoleChange(record)).await {
            tracing::warn!(%error, "Failed to write role change audit entry");
        }
    }
}

impl std::fmt::Debug for AuditSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditSink")
            .field("pending", &(self.sender.max_capacity() - self.sender.capacity()))
            .finish_non_exhaustive()
    }
}

async fn run_worker(mut receiver: mpsc::Receiver<AuditEntry>, store: Arc<dyn AuditStore>) {
    tracing::debug!("Audit worker started");
    while let Some(entry) = receiver.recv().await {
        if let Err(error) = store.append(entry).await {
            tracing::debug!(%error, "Failed to write audit record");
        }
    }
    tracing::debug!("Audit worker stopped");
}
