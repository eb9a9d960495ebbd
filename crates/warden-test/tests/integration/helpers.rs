#![allow(clippy::expect_used, dead_code)]
//! Test helpers for integration tests.
//!
//! Provides utilities for:
//! - Building the salvo service over an in-memory store
//! - Provisioning actors and workspace memberships
//! - Making HTTP requests with identity headers and asserting on responses

use std::sync::Arc;
use std::time::Duration;

use salvo::http::{Method, ReqBody, StatusCode};
use salvo::prelude::*;
use salvo::test::{RequestBuilder, ResponseExt};
use serde_json::Value;

use warden_test::component::authz::{AuditEntry, AuthorizationService, MemoryStore, Role, Stores};
use warden_test::component::config::{AuthzConfig, UnmatchedRoutePolicy};
use warden_test::component::constants::{
    ACTOR_ID_HEADER, FORWARDED_METHOD_HEADER, FORWARDED_URI_HEADER, TENANT_ID_HEADER,
    WORKSPACE_ID_HEADER,
};
use warden_test::component::engine::EngineHandler;
use warden_test::component::types::{UserId, WorkspaceId};

pub const OWNER: i64 = 1;
pub const ADMIN: i64 = 2;
pub const EDITOR: i64 = 3;
pub const AUTHOR: i64 = 4;
pub const VIEWER: i64 = 5;

pub const TENANT: i64 = 10;
pub const WORKSPACE: i64 = 7;

/// The service under test and the store behind it.
pub struct TestApp {
    pub service: Service,
    pub store: Arc<MemoryStore>,
}

impl TestApp {
    /// Builds the service with default configuration and one actor per role.
    pub async fn new() -> Self {
        Self::with_config(AuthzConfig::default()).await
    }

    /// Builds the service with the given unmatched-route policy.
    pub async fn with_unmatched(unmatched: UnmatchedRoutePolicy) -> Self {
        Self::with_config(AuthzConfig {
            unmatched_route: unmatched,
            ..AuthzConfig::default()
        })
        .await
    }

    /// Builds the service with `config` and one actor per role.
    pub async fn with_config(config: AuthzConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        for (id, role) in [
            (OWNER, Role::Owner),
            (ADMIN, Role::Admin),
            (EDITOR, Role::Editor),
            (AUTHOR, Role::Author),
            (VIEWER, Role::Viewer),
        ] {
            store.insert_actor(UserId::new(id), role);
        }

        let engine = AuthorizationService::from_config(&config, Stores::from_backend(store.clone()))
            .await
            .expect("engine builds");

        let router = Router::new()
            .hoop(EngineHandler {
                engine: Arc::new(engine),
            })
            .push(warden_test::app::api::routes().expect("API routes should be valid"));

        Self {
            service: Service::new(router),
            store,
        }
    }

    pub fn membership(&self, user_id: i64, workspace_id: i64, role: Role) {
        self.store
            .insert_membership(UserId::new(user_id), WorkspaceId::new(workspace_id), role);
    }

    /// Polls the store until it holds at least `count` audit entries.
    pub async fn audit_entries(&self, count: usize) -> Vec<AuditEntry> {
        for _ in 0..100 {
            let entries = self.store.audit_entries().await;
            if entries.len() >= count {
                return entries;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.store.audit_entries().await
    }
}

/// Test request builder for constructing HTTP requests.
pub struct TestRequest {
    method: Method,
    path: String,
    headers: Vec<(&'static str, String)>,
    body: Option<Vec<u8>>,
}

impl TestRequest {
    /// Creates a new test request with the given method and path.
    #[must_use]
    pub fn new(method: Method, path: &str) -> Self {
        Self {
            method,
            path: path.to_string(),
            headers: Vec::new(),
            body: None,
        }
    }

    #[must_use]
    pub fn get(path: &str) -> Self {
        Self::new(Method::GET, path)
    }

    #[must_use]
    pub fn post(path: &str) -> Self {
        Self::new(Method::POST, path)
    }

    #[must_use]
    pub fn delete(path: &str) -> Self {
        Self::new(Method::DELETE, path)
    }

    #[must_use]
    pub fn header(mut self, name: &'static str, value: impl ToString) -> Self {
        self.headers.push((name, value.to_string()));
        self
    }

    #[must_use]
    pub fn actor(self, id: i64) -> Self {
        self.header(ACTOR_ID_HEADER, id)
    }

    #[must_use]
    pub fn tenant(self, id: i64) -> Self {
        self.header(TENANT_ID_HEADER, id)
    }

    #[must_use]
    pub fn workspace(self, id: i64) -> Self {
        self.header(WORKSPACE_ID_HEADER, id)
    }

    /// Describes the request a forward-auth proxy is gating.
    #[must_use]
    pub fn forwarded(self, method: &str, uri: &str) -> Self {
        self.header(FORWARDED_METHOD_HEADER, method)
            .header(FORWARDED_URI_HEADER, uri)
    }

    #[must_use]
    pub fn json(mut self, body: &Value) -> Self {
        self.headers
            .push(("content-type", "application/json".to_string()));
        self.body = Some(body.to_string().into_bytes());
        self
    }

    /// Sends the request to the test service and returns the response.
    pub async fn send(self, service: &Service) -> TestResponse {
        let url = format!("http://127.0.0.1:5800{}", self.path);
        let mut client = RequestBuilder::new(&url, self.method);

        for (name, value) in self.headers {
            client = client.add_header(name, value, true);
        }
        if let Some(body_bytes) = self.body {
            client = client.body(ReqBody::Once(body_bytes.into()));
        }

        let mut response = client.send(service).await;
        let status = response
            .status_code
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = response.take_string().await.unwrap_or_default();

        TestResponse { status, body }
    }
}

/// Represents an HTTP test response for assertions.
pub struct TestResponse {
    pub status: StatusCode,
    pub body: String,
}

impl TestResponse {
    /// Asserts that the response status matches the expected code.
    #[must_use]
    pub fn assert_status(self, expected: StatusCode) -> Self {
        assert_eq!(
            self.status, expected,
            "Expected status {expected} but got {} with body {}",
            self.status, self.body
        );
        self
    }

    /// Parses the body as JSON.
    #[must_use]
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).expect("response body is JSON")
    }
}
