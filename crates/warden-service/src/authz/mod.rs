//! Authorization decision engine.
//!
//! ## Module Organization
//!
//! - `assign`: Role assignment operation and its cache invalidation
//! - `audit`: Non-blocking audit sink for granted decisions and role changes
//! - `cache`: Time-boxed permission cache and its storage backends
//! - `guard`: Decision point answering allow/deny for a request
//! - `matrix`: Static role → permission matrix loaded through Casbin
//! - `permission`: Scopes, permission triples, requirements and merged sets
//! - `policy`: Method/path policy rule fallback table
//! - `resolver`: Effective permission resolution from global and workspace roles
//! - `role`: Role vocabulary shared by global and workspace memberships
//! - `service`: `AuthorizationService` facade exposed to callers
//! - `store`: Directory, role store and audit store seams (memory, `PostgreSQL`)
//! - `subject`: Actor and workspace membership value types

pub mod assign;
pub mod audit;
pub mod cache;
pub mod guard;
pub mod matrix;
pub mod permission;
pub mod policy;
pub mod resolver;
pub mod role;
pub mod service;
pub mod store;
pub mod subject;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types at module level
pub use assign::{RoleAssigner, RoleAssignment};
pub use audit::{AuditEntry, AuditRecord, AuditSink, RoleChangeRecord};
pub use cache::{CacheKey, MemoryCacheStore, PermissionCache, PermissionCacheStore};
pub use guard::{AuthorizationRequest, Decision, DecisionReason, Guard, NOT_PERMITTED};
pub use matrix::RoleMatrix;
pub use permission::{
    PermissionRequirement, PermissionSet, PermissionTriple, Scope, ScopedRequirement,
};
pub use policy::{HttpMethod, PathPattern, PolicyRule, PolicyRuleTable};
pub use resolver::PermissionResolver;
pub use role::Role;
pub use service::{AuthorizationService, EngineOptions};
pub use store::{
    ActorDirectory, ActorProvisioner, AuditStore, MembershipDirectory, MemoryStore, PgStore,
    RoleStore, Stores, seed_actors,
};
pub use subject::{Actor, WorkspaceMembership};
