//! Shared fixtures for authorization tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Notify;
use warden_core::config::UnmatchedRoutePolicy;
use warden_core::types::{TenantId, UserId, WorkspaceId};

use super::assign::RoleAssignment;
use super::audit::{AuditEntry, AuditRecord, AuditSink};
use super::cache::{CacheKey, DEFAULT_TTL, MemoryCacheStore, PermissionCache, PermissionCacheStore};
use super::guard::Guard;
use super::matrix::RoleMatrix;
use super::permission::{PermissionSet, Scope};
use super::policy::PolicyRuleTable;
use super::resolver::PermissionResolver;
use super::role::Role;
use super::store::{ActorDirectory, AuditStore, MembershipDirectory, MemoryStore, RoleStore};
use super::subject::{Actor, WorkspaceMembership};
use crate::error::{ServiceError, ServiceResult};

pub async fn builtin_matrix() -> RoleMatrix {
    RoleMatrix::builtin().await.expect("builtin matrix loads")
}

/// A [`MemoryStore`] that counts directory lookups.
#[derive(Debug, Default)]
pub struct CountingStore {
    pub inner: MemoryStore,
    actor_lookups: AtomicUsize,
    membership_lookups: AtomicUsize,
}

impl CountingStore {
    pub fn actor_lookups(&self) -> usize {
        self.actor_lookups.load(Ordering::SeqCst)
    }

    pub fn membership_lookups(&self) -> usize {
        self.membership_lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ActorDirectory for CountingStore {
    async fn find_actor(&self, id: UserId) -> ServiceResult<Option<Actor>> {
        self.actor_lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.find_actor(id).await
    }
}

#[async_trait]
impl MembershipDirectory for CountingStore {
    async fn find_membership(
        &self,
        user_id: UserId,
        workspace_id: WorkspaceId,
    ) -> ServiceResult<Option<WorkspaceMembership>> {
        self.membership_lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.find_membership(user_id, workspace_id).await
    }
}

#[async_trait]
impl RoleStore for CountingStore {
    async fn apply_assignment(&self, assignment: &RoleAssignment) -> ServiceResult<()> {
        self.inner.apply_assignment(assignment).await
    }

    async fn remove_membership(
        &self,
        user_id: UserId,
        workspace_id: WorkspaceId,
    ) -> ServiceResult<bool> {
        self.inner.remove_membership(user_id, workspace_id).await
    }
}

#[async_trait]
impl AuditStore for CountingStore {
    async fn append(&self, entry: AuditEntry) -> ServiceResult<()> {
        self.inner.append(entry).await
    }
}

/// A [`MemoryStore`] whose next actor lookup can be parked until released.
#[derive(Debug, Default)]
pub struct GatedStore {
    pub inner: MemoryStore,
    armed: AtomicBool,
    started: Notify,
    release: Notify,
}

impl GatedStore {
    pub fn hold_next_lookup(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }

    /// Waits until a held lookup has begun.
    pub async fn lookup_started(&self) {
        self.started.notified().await;
    }

    pub fn release_lookup(&self) {
        self.release.notify_one();
    }
}

#[async_trait]
impl ActorDirectory for GatedStore {
    async fn find_actor(&self, id: UserId) -> ServiceResult<Option<Actor>> {
        if self.armed.swap(false, Ordering::SeqCst) {
            let actor = self.inner.find_actor(id).await;
            self.started.notify_one();
            self.release.notified().await;
            return actor;
        }
        self.inner.find_actor(id).await
    }
}

#[async_trait]
impl MembershipDirectory for GatedStore {
    async fn find_membership(
        &self,
        user_id: UserId,
        workspace_id: WorkspaceId,
    ) -> ServiceResult<Option<WorkspaceMembership>> {
        self.inner.find_membership(user_id, workspace_id).await
    }
}

/// Cache store whose every call fails.
#[derive(Debug)]
pub struct UnavailableCacheStore;

#[async_trait]
impl PermissionCacheStore for UnavailableCacheStore {
    async fn get(&self, _key: &CacheKey) -> ServiceResult<Option<Arc<PermissionSet>>> {
        Err(ServiceError::CacheUnavailable("connection refused".to_string()))
    }

    async fn put(
        &self,
        _key: CacheKey,
        _permissions: Arc<PermissionSet>,
        _ttl: Duration,
    ) -> ServiceResult<()> {
        Err(ServiceError::CacheUnavailable("connection refused".to_string()))
    }

    async fn remove(&self, _key: &CacheKey) -> ServiceResult<()> {
        Err(ServiceError::CacheUnavailable("connection refused".to_string()))
    }

    async fn remove_user(&self, _user_id: UserId) -> ServiceResult<()> {
        Err(ServiceError::CacheUnavailable("connection refused".to_string()))
    }
}

/// Audit store whose every write fails.
#[derive(Debug)]
pub struct FailingAuditStore;

#[async_trait]
impl AuditStore for FailingAuditStore {
    async fn append(&self, _entry: AuditEntry) -> ServiceResult<()> {
        Err(ServiceError::AuditWriteFailed("disk full".to_string()))
    }
}

pub fn allowed_record(actor_id: UserId) -> AuditRecord {
    AuditRecord {
        actor_id,
        tenant_id: Some(TenantId::new(10)),
        workspace_id: None,
        resource: "notifications".to_string(),
        action: "read".to_string(),
        scope: Scope::Global,
        timestamp: Utc::now(),
        request_method: Some("GET".to_string()),
        request_path: Some("/notifications".to_string()),
    }
}

/// Polls `store` until it holds at least `count` audit entries.
pub async fn wait_for_audit(store: &MemoryStore, count: usize) -> Vec<AuditEntry> {
    for _ in 0..100 {
        let entries = store.audit_entries().await;
        if entries.len() >= count {
            return entries;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    store.audit_entries().await
}

/// A guard over a counting store and an in-memory cache.
pub struct Fixture {
    pub guard: Guard,
    pub store: Arc<CountingStore>,
}

impl Fixture {
    pub async fn new(unmatched: UnmatchedRoutePolicy) -> Self {
        Self::build(builtin_matrix().await, unmatched, None)
    }

    pub async fn from_matrix(policy: &str, unmatched: UnmatchedRoutePolicy) -> Self {
        let matrix = RoleMatrix::from_casbin_policy(policy)
            .await
            .expect("test matrix loads");
        Self::build(matrix, unmatched, None)
    }

    pub async fn with_failing_audit(unmatched: UnmatchedRoutePolicy) -> Self {
        Self::build(builtin_matrix().await, unmatched, Some(Arc::new(FailingAuditStore)))
    }

    fn build(
        matrix: RoleMatrix,
        unmatched: UnmatchedRoutePolicy,
        audit_store: Option<Arc<dyn AuditStore>>,
    ) -> Self {
        let store = Arc::new(CountingStore::default());
        let resolver = PermissionResolver::new(Arc::new(matrix), store.clone(), store.clone());
        let cache = Arc::new(PermissionCache::new(
            Arc::new(MemoryCacheStore::new(64)),
            resolver,
            DEFAULT_TTL,
        ));
        let audit_store: Arc<dyn AuditStore> = match audit_store {
            Some(audit_store) => audit_store,
            None => store.clone(),
        };
        let (audit, _worker) = AuditSink::spawn(audit_store, 64);
        let rules = Arc::new(PolicyRuleTable::builtin().expect("builtin rules"));

        Self {
            guard: Guard::new(rules, cache, audit, unmatched),
            store,
        }
    }

    /// Provisions an actor and returns it.
    pub fn actor(&self, id: i64, role: Role) -> Actor {
        let id = UserId::new(id);
        self.store.inner.insert_actor(id, role.clone());
        Actor::new(id, role)
    }
}
