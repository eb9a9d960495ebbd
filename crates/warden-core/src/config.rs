use anyhow::Result;
use config::{Config, ConfigBuilder, builder::DefaultState};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub authz: AuthzConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    Memory,
    Postgres,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Actors provisioned at start. Existing actors keep their role.
    #[serde(default)]
    pub seed_actors: Vec<SeedActor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SeedActor {
    pub id: i64,
    pub role: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    /// ## Summary
    /// Returns the bind address as a string in the format "host:port".
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

/// What the decision point does when a request carries no explicit
/// requirement and no policy rule matches its method and path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmatchedRoutePolicy {
    Allow,
    Deny,
}

/// A policy rule as written in configuration. Validated by the service layer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PolicyRuleConfig {
    pub method: String,
    pub path: String,
    pub resource: String,
    pub action: String,
    pub scope: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthzConfig {
    pub cache_ttl_seconds: u64,
    pub cache_capacity: usize,
    pub audit_channel_capacity: usize,
    pub unmatched_route: UnmatchedRoutePolicy,
    /// Casbin policy file (`p, ROLE, resource, action, scope`) replacing the built-in matrix.
    #[serde(default)]
    pub role_matrix_path: Option<String>,
    /// Replaces the built-in policy rule table when present.
    #[serde(default)]
    pub policy_rules: Option<Vec<PolicyRuleConfig>>,
}

impl Default for AuthzConfig {
    fn default() -> Self {
        Self {
            cache_ttl_seconds: 300,
            cache_capacity: 10_000,
            audit_channel_capacity: 1024,
            unmatched_route: UnmatchedRoutePolicy::Allow,
            role_matrix_path: None,
            policy_rules: None,
        }
    }
}

impl Settings {
    /// ## Summary
    /// Returns a config builder pre-populated with every default value.
    ///
    /// ## Errors
    /// Returns an error if a default cannot be registered.
    pub fn defaults() -> Result<ConfigBuilder<DefaultState>> {
        let authz = AuthzConfig::default();
        Ok(Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8698)?
            .set_default("database.max_connections", 4)?
            .set_default("storage.backend", "memory")?
            .set_default("logging.level", "info")?
            .set_default("authz.cache_ttl_seconds", authz.cache_ttl_seconds)?
            .set_default(
                "authz.cache_capacity",
                u64::try_from(authz.cache_capacity).unwrap_or(u64::MAX),
            )?
            .set_default(
                "authz.audit_channel_capacity",
                u64::try_from(authz.audit_channel_capacity).unwrap_or(u64::MAX),
            )?
            .set_default("authz.unmatched_route", "allow")?)
    }

    /// ## Summary
    /// Loads configuration from environment variables and an optional `config.toml`.
    /// Environment variables use the `WARDEN__SECTION__KEY` form and take
    /// precedence over file values.
    ///
    /// ## Errors
    /// Returns an error if building the configuration or deserializing it fails.
    pub fn load() -> Result<Self> {
        Ok(Self::defaults()?
            // TOML file
            .add_source(config::File::with_name("config.toml").required(false))
            // Env
            .add_source(
                config::Environment::with_prefix("WARDEN")
                    .separator("__")
                    .ignore_empty(true)
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<Settings>()?)
    }
}

/// ## Summary
/// Loads configuration from environment variables and `.env` file.
///
/// ## Errors
/// Returns an error if loading or deserializing the configuration fails.
pub fn load_config() -> Result<Settings> {
    dotenvy::dotenv().ok();

    Settings::load()
}
