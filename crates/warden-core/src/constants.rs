/// Route component constants shared across crates
pub const API_ROUTE_COMPONENT: &str = "api";
pub const API_ROUTE_PREFIX: &str = const_str::concat!("/", API_ROUTE_COMPONENT);

pub const AUTHZ_ROUTE_COMPONENT: &str = "authz";
pub const AUTHZ_ROUTE_PREFIX: &str =
    const_str::concat!(API_ROUTE_PREFIX, "/", AUTHZ_ROUTE_COMPONENT);

pub const ADMIN_ROUTE_COMPONENT: &str = "admin";
pub const ADMIN_ROUTE_PREFIX: &str =
    const_str::concat!(API_ROUTE_PREFIX, "/", ADMIN_ROUTE_COMPONENT);

/// Headers set by the fronting identity proxy.
pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const TENANT_ID_HEADER: &str = "x-tenant-id";
pub const WORKSPACE_ID_HEADER: &str = "x-workspace-id";

/// Reserved wildcard for resources and actions.
pub const WILDCARD: &str = "*";

/// Headers a forward-auth proxy sets to describe the request it is gating.
pub const FORWARDED_METHOD_HEADER: &str = "x-forwarded-method";
pub const FORWARDED_URI_HEADER: &str = "x-forwarded-uri";
