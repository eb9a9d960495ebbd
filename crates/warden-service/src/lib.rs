//! Authorization decision engine: role matrix, policy fallback, permission
//! resolution and caching, the decision point and its audit trail.

pub mod authz;
pub mod error;
