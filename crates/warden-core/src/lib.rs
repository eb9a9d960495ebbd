//! Shared configuration, identifiers and errors for the Warden workspace.

pub mod config;
pub mod constants;
pub mod error;
pub mod types;
