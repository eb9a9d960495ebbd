//! Static role → permission matrix.
//!
//! The matrix is written as a Casbin policy (`p, ROLE, resource, action, scope`)
//! and loaded once at startup. Casbin validates the policy against the bundled
//! model and de-duplicates lines; the resulting rows are then flattened into
//! per-role triple lists so lookups never touch the enforcer.

use std::collections::HashMap;

use casbin::{CoreApi, MgmtApi};
use string_adapter::StringAdapter;

use super::permission::{PermissionTriple, Scope};
use super::role::Role;
use crate::error::{ServiceError, ServiceResult};

const MODEL: &str = include_str!("role_matrix.conf");
const BUILTIN_POLICY: &str = include_str!("role_matrix.csv");

/// Role → ordered permission triples. Read-only after construction.
#[derive(Debug, Clone, Default)]
pub struct RoleMatrix {
    entries: HashMap<Role, Vec<PermissionTriple>>,
}

impl RoleMatrix {
    /// ## Summary
    /// Builds the matrix shipped with the service.
    ///
    /// ## Errors
    /// Returns an error if the bundled policy fails to load.
    pub async fn builtin() -> ServiceResult<Self> {
        Self::from_casbin_policy(BUILTIN_POLICY).await
    }

    /// ## Summary
    /// Loads the matrix from a policy file, or the built-in matrix when no
    /// path is configured.
    ///
    /// ## Errors
    /// Returns an error if the file cannot be read or contains invalid rows.
    #[tracing::instrument]
    pub async fn load(path: Option<&str>) -> ServiceResult<Self> {
        let Some(path) = path else {
            return Self::builtin().await;
        };

        let policy = tokio::fs::read_to_string(path).await?;
        tracing::debug!(path, "Read role matrix policy file");
        Self::from_casbin_policy(&policy).await
    }

    /// ## Summary
    /// Parses a Casbin policy string into a matrix.
    ///
    /// ## Errors
    /// Returns an error if Casbin rejects the policy or a row names an unknown
    /// role or scope.
    pub async fn from_casbin_policy(policy: &str) -> ServiceResult<Self> {
        let model = casbin::DefaultModel::from_str(MODEL).await?;
        let adapter = StringAdapter::new(policy);
        let enforcer = casbin::Enforcer::new(model, adapter).await?;

        let matrix = Self::from_rules(enforcer.get_policy())?;
        tracing::info!(
            roles = matrix.entries.len(),
            triples = matrix.entries.values().map(Vec::len).sum::<usize>(),
            "Role matrix loaded"
        );
        Ok(matrix)
    }

    /// ## Summary
    /// Builds a matrix from `[role, resource, action, scope]` rows, keeping row
    /// order per role. Rows for OWNER are skipped since owners never consult
    /// the matrix.
    ///
    /// ## Errors
    /// Returns `InvalidConfiguration` for rows of the wrong arity, unknown roles
    /// or unknown scopes.
    pub fn from_rules(rules: Vec<Vec<String>>) -> ServiceResult<Self> {
        let mut entries: HashMap<Role, Vec<PermissionTriple>> = HashMap::new();

        for rule in rules {
            let [role, resource, action, scope] = <[String; 4]>::try_from(rule).map_err(|row| {
                ServiceError::InvalidConfiguration(format!(
                    "role matrix row must have 4 fields, got {row:?}"
                ))
            })?;

            let role = Role::parse(&role);
            if !role.is_recognized() {
                return Err(ServiceError::InvalidConfiguration(format!(
                    "role matrix names unknown role {role}"
                )));
            }
            if role.is_owner() {
                tracing::warn!(%resource, %action, "Ignoring OWNER row in role matrix");
                continue;
            }

            let scope = Scope::parse(&scope).ok_or_else(|| {
                ServiceError::InvalidConfiguration(format!(
                    "role matrix row for {role} has unknown scope {scope:?}"
                ))
            })?;

            let triple = PermissionTriple::new(resource.trim(), action.trim(), scope);
            let triples = entries.entry(role).or_default();
            if !triples.contains(&triple) {
                triples.push(triple);
            }
        }

        Ok(Self { entries })
    }

    /// Standing permissions of `role`. Unknown roles and OWNER have none here.
    #[must_use]
    pub fn lookup(&self, role: &Role) -> &[PermissionTriple] {
        self.entries.get(role).map_or(&[], Vec::as_slice)
    }

    pub fn roles(&self) -> impl Iterator<Item = &Role> {
        self.entries.keys()
    }
}
