//! HTTP sidecar exposing the authorization engine.

pub mod app;
pub mod depot;
pub mod engine_handler;
pub mod error;
pub mod middleware;
