//! Time-boxed permission cache.
//!
//! Entries are keyed by `(user, tenant?, workspace?)` and hold exactly what the
//! resolver produced for that key. Only successful resolutions are stored.
//! Store failures degrade to resolving directly.
//!
//! Each user carries an invalidation generation. A resolution that overlaps an
//! invalidation for the same user removes its own entry again after writing,
//! so a completed invalidation is never undone by a slower reader. A user's
//! generation is only tracked while a resolution for that user is in flight.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::time::Instant;
use warden_core::types::{TenantId, UserId, WorkspaceId};

use super::permission::PermissionSet;
use super::resolver::PermissionResolver;
use crate::error::ServiceResult;

/// Default entry lifetime.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub user_id: UserId,
    pub tenant_id: Option<TenantId>,
    pub workspace_id: Option<WorkspaceId>,
}

impl CacheKey {
    #[must_use]
    pub const fn new(
        user_id: UserId,
        tenant_id: Option<TenantId>,
        workspace_id: Option<WorkspaceId>,
    ) -> Self {
        Self {
            user_id,
            tenant_id,
            workspace_id,
        }
    }
}

/// Key-value storage with per-entry expiry.
#[async_trait]
pub trait PermissionCacheStore: Send + Sync {
    /// Returns the live entry for `key`, if any.
    async fn get(&self, key: &CacheKey) -> ServiceResult<Option<Arc<PermissionSet>>>;

    /// Stores `permissions` for `ttl`, overwriting any previous entry.
    async fn put(
        &self,
        key: CacheKey,
        permissions: Arc<PermissionSet>,
        ttl: Duration,
    ) -> ServiceResult<()>;

    async fn remove(&self, key: &CacheKey) -> ServiceResult<()>;

    /// Removes every entry of `user_id` whatever its tenant or workspace.
    async fn remove_user(&self, user_id: UserId) -> ServiceResult<()>;
}

#[derive(Debug)]
struct CacheEntry {
    permissions: Arc<PermissionSet>,
    expires_at: Instant,
}

/// In-process store. Expired entries are dropped on read and swept when the
/// capacity bound is reached. If the store is still full after a sweep, new
/// entries are not stored.
#[derive(Debug)]
pub struct MemoryCacheStore {
    entries: DashMap<CacheKey, CacheEntry>,
    capacity: usize,
}

impl MemoryCacheStore {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl PermissionCacheStore for MemoryCacheStore {
    async fn get(&self, key: &CacheKey) -> ServiceResult<Option<Arc<PermissionSet>>> {
        let now = Instant::now();
        let lookup = self
            .entries
            .get(key)
            .map(|entry| (entry.expires_at > now).then(|| entry.permissions.clone()));

        match lookup {
            Some(Some(permissions)) => Ok(Some(permissions)),
            Some(None) => {
                self.entries.remove_if(key, |_, entry| entry.expires_at <= now);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn put(
        &self,
        key: CacheKey,
        permissions: Arc<PermissionSet>,
        ttl: Duration,
    ) -> ServiceResult<()> {
        let now = Instant::now();

        if self.entries.len() >= self.capacity && !self.entries.contains_key(&key) {
            self.entries.retain(|_, entry| entry.expires_at > now);
            if self.entries.len() >= self.capacity {
                tracing::debug!(
                    capacity = self.capacity,
                    "Permission cache full; entry not stored"
                );
                return Ok(());
            }
        }

        self.entries.insert(
            key,
            CacheEntry {
                permissions,
                expires_at: now + ttl,
            },
        );
        Ok(())
    }

    async fn remove(&self, key: &CacheKey) -> ServiceResult<()> {
        self.entries.remove(key);
        Ok(())
    }

    async fn remove_user(&self, user_id: UserId) -> ServiceResult<()> {
        self.entries.retain(|key, _| key.user_id != user_id);
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Generation {
    value: u64,
    in_flight: usize,
}

/// Marks one resolution in flight for a user. Dropping it releases the
/// user's generation once no other resolution holds it.
struct InFlight<'a> {
    generations: &'a DashMap<UserId, Generation>,
    user_id: UserId,
    observed: u64,
}

impl<'a> InFlight<'a> {
    fn begin(generations: &'a DashMap<UserId, Generation>, user_id: UserId) -> Self {
        let mut generation = generations.entry(user_id).or_default();
        generation.in_flight += 1;
        let observed = generation.value;
        drop(generation);
        Self {
            generations,
            user_id,
            observed,
        }
    }

    fn is_stale(&self) -> bool {
        self.generations
            .get(&self.user_id)
            .is_some_and(|generation| generation.value != self.observed)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if let Some(mut generation) = self.generations.get_mut(&self.user_id) {
            generation.in_flight = generation.in_flight.saturating_sub(1);
        }
        self.generations
            .remove_if(&self.user_id, |_, generation| generation.in_flight == 0);
    }
}

/// Memoizes [`PermissionResolver`] results.
pub struct PermissionCache {
    store: Arc<dyn PermissionCacheStore>,
    resolver: PermissionResolver,
    ttl: Duration,
    generations: DashMap<UserId, Generation>,
}

impl PermissionCache {
    #[must_use]
    pub fn new(
        store: Arc<dyn PermissionCacheStore>,
        resolver: PermissionResolver,
        ttl: Duration,
    ) -> Self {
        Self {
            store,
            resolver,
            ttl,
            generations: DashMap::new(),
        }
    }

    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    #[must_use]
    pub const fn resolver(&self) -> &PermissionResolver {
        &self.resolver
    }

    /// ## Summary
    /// Returns the cached permissions for `key`, resolving and storing them on
    /// a miss.
    ///
    /// ## Errors
    /// Returns the resolver's error (`ActorNotFound`, store failures). Errors
    /// are never cached. Cache store failures are logged and bypassed.
    #[tracing::instrument(skip(self), fields(user_id = %key.user_id))]
    pub async fn get_or_resolve(&self, key: CacheKey) -> ServiceResult<Arc<PermissionSet>> {
        match self.store.get(&key).await {
            Ok(Some(permissions)) => {
                tracing::trace!("Permission cache hit");
                return Ok(permissions);
            }
            Ok(None) => tracing::trace!("Permission cache miss"),
            Err(error) => {
                tracing::warn!(%error, "Permission cache unavailable; resolving directly");
            }
        }

        let in_flight = InFlight::begin(&self.generations, key.user_id);
        let permissions = Arc::new(
            self.resolver
                .resolve(key.user_id, key.tenant_id, key.workspace_id)
                .await?,
        );

        if let Err(error) = self.store.put(key, permissions.clone(), self.ttl).await {
            tracing::warn!(%error, "Failed to store resolved permissions");
            return Ok(permissions);
        }

        if in_flight.is_stale() {
            tracing::debug!("Invalidated during resolution; dropping cached entry");
            if let Err(error) = self.store.remove(&key).await {
                tracing::warn!(%error, "Failed to drop raced cache entry");
            }
        }

        Ok(permissions)
    }

    /// ## Summary
    /// Removes exactly the entry for `key`.
    ///
    /// ## Errors
    /// Returns the store error if the entry could not be removed.
    #[tracing::instrument(skip(self), fields(user_id = %key.user_id))]
    pub async fn invalidate(&self, key: CacheKey) -> ServiceResult<()> {
        self.bump_generation(key.user_id);
        self.store.remove(&key).await?;
        tracing::debug!("Permission cache entry invalidated");
        Ok(())
    }

    /// ## Summary
    /// Removes every entry for `user_id`.
    ///
    /// ## Errors
    /// Returns the store error if the entries could not be removed.
    #[tracing::instrument(skip(self))]
    pub async fn invalidate_all(&self, user_id: UserId) -> ServiceResult<()> {
        self.bump_generation(user_id);
        self.store.remove_user(user_id).await?;
        tracing::debug!("Permission cache entries invalidated for user");
        Ok(())
    }

    // Without a resolution in flight there is nothing to mark stale.
    fn bump_generation(&self, user_id: UserId) {
        if let Some(mut generation) = self.generations.get_mut(&user_id) {
            generation.value += 1;
        }
    }
}

impl std::fmt::Debug for PermissionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionCache")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
