//! Method/path policy rules used when a call site declares no requirement.
//!
//! Rules are ordered and the first match wins. Paths use a simple glob where
//! `*` matches any run of characters, `/` included.

use serde::Serialize;
use warden_core::config::PolicyRuleConfig;

use super::permission::{PermissionRequirement, Scope};
use crate::error::{ServiceError, ServiceResult};

/// HTTP methods a policy rule can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
}

impl HttpMethod {
    /// Parse a method name (case-insensitive).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "GET" => Some(Self::Get),
            "HEAD" => Some(Self::Head),
            "POST" => Some(Self::Post),
            "PUT" => Some(Self::Put),
            "PATCH" => Some(Self::Patch),
            "DELETE" => Some(Self::Delete),
            "OPTIONS" => Some(Self::Options),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Options => "OPTIONS",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A path glob such as `/workspaces/*/articles*`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PathPattern(String);

impl PathPattern {
    /// ## Summary
    /// Creates a pattern. Patterns must be absolute.
    ///
    /// ## Errors
    /// Returns `InvalidConfiguration` if the pattern does not start with `/`.
    pub fn new(pattern: impl Into<String>) -> ServiceResult<Self> {
        let pattern = pattern.into();
        if !pattern.starts_with('/') {
            return Err(ServiceError::InvalidConfiguration(format!(
                "policy path pattern must start with '/': {pattern:?}"
            )));
        }
        Ok(Self(pattern))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        wildcard_match(self.0.as_bytes(), path.as_bytes())
    }
}

/// Iterative glob match with single-star backtracking.
fn wildcard_match(pattern: &[u8], value: &[u8]) -> bool {
    let (mut p_idx, mut v_idx) = (0usize, 0usize);
    let mut star: Option<(usize, usize)> = None;

    while v_idx < value.len() {
        match pattern.get(p_idx) {
            Some(b'*') => {
                star = Some((p_idx, v_idx));
                p_idx += 1;
            }
            Some(&byte) if byte == value[v_idx] => {
                p_idx += 1;
                v_idx += 1;
            }
            _ => match star {
                Some((star_idx, matched)) => {
                    p_idx = star_idx + 1;
                    v_idx = matched + 1;
                    star = Some((star_idx, v_idx));
                }
                None => return false,
            },
        }
    }

    pattern[p_idx..].iter().all(|&byte| byte == b'*')
}

/// A fallback requirement for requests matching `method` and `path`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyRule {
    pub method: HttpMethod,
    pub path: PathPattern,
    pub resource: String,
    pub action: String,
    pub scope: Scope,
}

impl PolicyRule {
    /// ## Summary
    /// Creates a rule.
    ///
    /// ## Errors
    /// Returns `InvalidConfiguration` if the path pattern is not absolute.
    pub fn new(
        method: HttpMethod,
        path: &str,
        resource: &str,
        action: &str,
        scope: Scope,
    ) -> ServiceResult<Self> {
        Ok(Self {
            method,
            path: PathPattern::new(path)?,
            resource: resource.to_string(),
            action: action.to_string(),
            scope,
        })
    }

    /// The requirement this rule stands in for. Its scope is always explicit.
    #[must_use]
    pub fn requirement(&self) -> PermissionRequirement {
        PermissionRequirement::new(self.resource.clone(), self.action.clone())
            .with_scope(self.scope)
    }
}

impl TryFrom<&PolicyRuleConfig> for PolicyRule {
    type Error = ServiceError;

    fn try_from(config: &PolicyRuleConfig) -> Result<Self, Self::Error> {
        let method = HttpMethod::parse(&config.method).ok_or_else(|| {
            ServiceError::InvalidConfiguration(format!(
                "policy rule has unknown method {:?}",
                config.method
            ))
        })?;
        let scope = Scope::parse(&config.scope).ok_or_else(|| {
            ServiceError::InvalidConfiguration(format!(
                "policy rule has unknown scope {:?}",
                config.scope
            ))
        })?;
        if config.resource.trim().is_empty() || config.action.trim().is_empty() {
            return Err(ServiceError::InvalidConfiguration(format!(
                "policy rule for {} {} needs a resource and an action",
                config.method, config.path
            )));
        }
        Self::new(
            method,
            &config.path,
            config.resource.trim(),
            config.action.trim(),
            scope,
        )
    }
}

/// Ordered policy rules. Read-only after construction.
#[derive(Debug, Clone, Default)]
pub struct PolicyRuleTable {
    rules: Vec<PolicyRule>,
}

impl PolicyRuleTable {
    #[must_use]
    pub const fn new(rules: Vec<PolicyRule>) -> Self {
        Self { rules }
    }

    /// ## Summary
    /// The rule table shipped with the service.
    ///
    /// ## Errors
    /// Never fails in practice; the built-in patterns are all absolute.
    pub fn builtin() -> ServiceResult<Self> {
        use HttpMethod::{Delete, Get, Patch, Post, Put};
        use Scope::{Global, Tenant, Workspace};

        let rules = [
            (Post, "/owner/plugins/*", "plugins", "manage", Tenant),
            (Get, "/owner/plugins*", "plugins", "read", Tenant),
            (Get, "/owner/queues*", "queues", "read", Tenant),
            (Post, "/owner/queues/*", "queues", "manage", Tenant),
            (Get, "/workspaces/*/articles*", "articles", "read", Workspace),
            (Post, "/workspaces/*/articles", "articles", "create", Workspace),
            (Put, "/workspaces/*/articles/*", "articles", "update", Workspace),
            (Patch, "/workspaces/*/articles/*", "articles", "update", Workspace),
            (Delete, "/workspaces/*/articles/*", "articles", "delete", Workspace),
            (Get, "/notifications*", "notifications", "read", Global),
        ];

        rules
            .into_iter()
            .map(|(method, path, resource, action, scope)| {
                PolicyRule::new(method, path, resource, action, scope)
            })
            .collect::<ServiceResult<Vec<_>>>()
            .map(Self::new)
    }

    /// ## Summary
    /// Builds a table from configuration, preserving order.
    ///
    /// ## Errors
    /// Returns `InvalidConfiguration` for the first invalid rule.
    pub fn from_config(rules: &[PolicyRuleConfig]) -> ServiceResult<Self> {
        rules
            .iter()
            .map(PolicyRule::try_from)
            .collect::<ServiceResult<Vec<_>>>()
            .map(Self::new)
    }

    /// First rule whose method name equals `method` byte for byte and whose
    /// pattern matches `path`. Callers normalise case before asking.
    #[must_use]
    pub fn find(&self, method: &str, path: &str) -> Option<&PolicyRule> {
        self.rules
            .iter()
            .find(|rule| rule.method.as_str() == method && rule.path.matches(path))
    }

    #[must_use]
    pub fn rules(&self) -> &[PolicyRule] {
        &self.rules
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
