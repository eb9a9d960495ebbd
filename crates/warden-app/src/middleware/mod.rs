pub mod actor;
pub mod authorize;
