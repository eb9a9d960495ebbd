//! HTTP integration tests for the authorization sidecar.

mod admin;
mod authz;
mod helpers;
