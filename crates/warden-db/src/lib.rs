//! PostgreSQL persistence for actors, workspace memberships and the audit log.

pub mod db;
pub mod error;
pub mod model;
