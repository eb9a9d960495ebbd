//! Warden authorization engine - integration test support.
//!
//! This crate re-exports the workspace crates so integration tests can use
//! `warden_test::` paths.

pub mod component {
    pub use warden_core::{config, constants, types};
    pub use warden_service::authz;
    pub use warden_service::error;

    pub mod engine {
        pub use warden_app::engine_handler::EngineHandler;
    }

    pub mod middleware {
        pub use warden_app::middleware::*;
    }
}

pub mod app {
    pub use warden_app::*;

    pub mod api {
        pub use warden_app::app::api::*;
    }
}
