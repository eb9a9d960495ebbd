//! Permission triples, requirements and merged permission sets.
//!
//! A triple `(resource, action, scope)` is the atomic unit of a grant. A
//! requirement is what a call site asks for; once its scope is settled it
//! becomes a [`ScopedRequirement`] that triples are matched against.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use warden_core::constants::WILDCARD;
use warden_core::types::{TenantId, WorkspaceId};

/// Breadth at which a permission applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Global,
    Tenant,
    Workspace,
}

impl Scope {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Tenant => "tenant",
            Self::Workspace => "workspace",
        }
    }

    /// Parse a scope name (case-insensitive).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "global" => Some(Self::Global),
            "tenant" => Some(Self::Tenant),
            "workspace" => Some(Self::Workspace),
            _ => None,
        }
    }

    /// Scope implied by the request context when a requirement declares none:
    /// workspace if a workspace is present, else tenant if a tenant is present,
    /// else global.
    #[must_use]
    pub const fn from_context(tenant_id: Option<TenantId>, workspace_id: Option<WorkspaceId>) -> Self {
        if workspace_id.is_some() {
            Self::Workspace
        } else if tenant_id.is_some() {
            Self::Tenant
        } else {
            Self::Global
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable grant of `action` on `resource` at `scope`. Resource and
/// action may be the `*` wildcard.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PermissionTriple {
    resource: String,
    action: String,
    scope: Scope,
}

impl PermissionTriple {
    #[must_use]
    pub fn new(resource: impl Into<String>, action: impl Into<String>, scope: Scope) -> Self {
        Self {
            resource: resource.into(),
            action: action.into(),
            scope,
        }
    }

    /// The `{*, *, global}` grant held implicitly by owners.
    #[must_use]
    pub fn universal() -> Self {
        Self::new(WILDCARD, WILDCARD, Scope::Global)
    }

    #[must_use]
    pub fn resource(&self) -> &str {
        &self.resource
    }

    #[must_use]
    pub fn action(&self) -> &str {
        &self.action
    }

    #[must_use]
    pub const fn scope(&self) -> Scope {
        self.scope
    }

    /// Deduplication key used when merging sets.
    #[must_use]
    pub fn key(&self) -> (Scope, &str, &str) {
        (self.scope, &self.resource, &self.action)
    }

    /// Returns `true` if this grant satisfies `requirement`.
    ///
    /// Resource and action match exactly or through `*`. The scope matches when
    /// it equals the requirement's scope, or when this grant is global.
    #[must_use]
    pub fn satisfies(&self, requirement: &ScopedRequirement) -> bool {
        (self.resource == WILDCARD || self.resource == requirement.resource)
            && (self.action == WILDCARD || self.action == requirement.action)
            && (self.scope == requirement.scope || self.scope == Scope::Global)
    }
}

impl std::fmt::Display for PermissionTriple {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.resource, self.action, self.scope)
    }
}

/// Permission a call site declares before running its business logic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PermissionRequirement {
    pub resource: String,
    pub action: String,
    /// Settled from the request context when absent.
    #[serde(default)]
    pub scope: Option<Scope>,
}

impl PermissionRequirement {
    #[must_use]
    pub fn new(resource: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            action: action.into(),
            scope: None,
        }
    }

    #[must_use]
    pub const fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = Some(scope);
        self
    }

    /// Settle the effective scope: the declared scope if any, else the scope
    /// implied by the request context.
    #[must_use]
    pub fn scoped(
        &self,
        tenant_id: Option<TenantId>,
        workspace_id: Option<WorkspaceId>,
    ) -> ScopedRequirement {
        ScopedRequirement {
            resource: self.resource.clone(),
            action: self.action.clone(),
            scope: self
                .scope
                .unwrap_or_else(|| Scope::from_context(tenant_id, workspace_id)),
        }
    }
}

/// A requirement whose scope has been settled.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ScopedRequirement {
    pub resource: String,
    pub action: String,
    pub scope: Scope,
}

impl std::fmt::Display for ScopedRequirement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}@{}", self.resource, self.action, self.scope)
    }
}

/// Effective permissions of an actor in a tenant/workspace context.
///
/// Deduplicated by `(scope, resource, action)` and kept in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PermissionSet {
    triples: Vec<PermissionTriple>,
}

impl PermissionSet {
    /// The set held by owners: `{*, *, global}`.
    #[must_use]
    pub fn universal() -> Self {
        Self {
            triples: vec![PermissionTriple::universal()],
        }
    }

    /// Merge `base` and `workspace` into one set.
    ///
    /// Deduplicates by `(scope, resource, action)`; the first occurrence wins
    /// and order is preserved, so the result depends only on the inputs.
    #[must_use]
    pub fn merge(base: &[PermissionTriple], workspace: &[PermissionTriple]) -> Self {
        let mut seen: HashSet<(Scope, &str, &str)> =
            HashSet::with_capacity(base.len() + workspace.len());
        let triples = base
            .iter()
            .chain(workspace)
            .filter(|triple| seen.insert(triple.key()))
            .cloned()
            .collect();
        Self { triples }
    }

    /// Returns `true` if any triple satisfies `requirement`.
    #[must_use]
    pub fn allows(&self, requirement: &ScopedRequirement) -> bool {
        self.triples.iter().any(|triple| triple.satisfies(requirement))
    }

    #[must_use]
    pub fn as_slice(&self) -> &[PermissionTriple] {
        &self.triples
    }

    pub fn iter(&self) -> impl Iterator<Item = &PermissionTriple> {
        self.triples.iter()
    }

    #[must_use]
    pub fn contains(&self, triple: &PermissionTriple) -> bool {
        self.triples.contains(triple)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.triples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }
}

impl<'a> IntoIterator for &'a PermissionSet {
    type Item = &'a PermissionTriple;
    type IntoIter = std::slice::Iter<'a, PermissionTriple>;

    fn into_iter(self) -> Self::IntoIter {
        self.triples.iter()
    }
}
