#![allow(clippy::too_many_lines)]
//! Decision endpoint integration tests.
//!
//! Drives `/api/authz/*` with identity headers over the built-in role matrix
//! and policy rule table:
//! - `check` answers `{allowed}` for a described request
//! - `forward` gates the request named by `X-Forwarded-Method`/`X-Forwarded-Uri`
//! - `me/permissions` lists the caller's effective permissions

use salvo::http::StatusCode;
use serde_json::{Value, json};

use super::helpers::*;
use warden_test::component::authz::{AuditEntry, Role, Scope};
use warden_test::component::config::UnmatchedRoutePolicy;
use warden_test::component::constants::TENANT_ID_HEADER;

async fn check(app: &TestApp, request: TestRequest, body: &Value) -> bool {
    let res = request
        .json(body)
        .send(&app.service)
        .await
        .assert_status(StatusCode::OK);
    res.json()["allowed"]
        .as_bool()
        .expect("allowed is a boolean")
}

fn check_request(actor: i64) -> TestRequest {
    TestRequest::post("/api/authz/check").actor(actor)
}

#[test_log::test(tokio::test)]
async fn healthcheck_needs_no_identity() {
    let app = TestApp::new().await;
    let res = TestRequest::get("/api/app/healthcheck")
        .send(&app.service)
        .await
        .assert_status(StatusCode::OK);
    assert_eq!(res.body, "OK");
}

#[test_log::test(tokio::test)]
async fn plugin_route_resolves_to_tenant_scoped_manage() {
    let app = TestApp::new().await;
    let body = json!({"method": "POST", "path": "/owner/plugins/42/enable"});

    assert!(check(&app, check_request(OWNER).tenant(TENANT), &body).await);
    // ADMIN holds (*, *, tenant).
    assert!(check(&app, check_request(ADMIN).tenant(TENANT), &body).await);
    assert!(!check(&app, check_request(EDITOR).tenant(TENANT), &body).await);
}

#[test_log::test(tokio::test)]
async fn workspace_actions_need_a_membership() {
    let app = TestApp::new().await;
    let body = json!({"method": "PUT", "path": "/workspaces/7/articles/3"});

    assert!(!check(&app, check_request(AUTHOR).tenant(TENANT).workspace(WORKSPACE), &body).await);

    // Direct store writes do not invalidate, so ask in an uncached context.
    app.membership(AUTHOR, WORKSPACE, Role::Author);
    assert!(check(&app, check_request(AUTHOR).workspace(WORKSPACE), &body).await);
    assert!(!check(&app, check_request(AUTHOR).workspace(8), &body).await);
}

#[test_log::test(tokio::test)]
async fn explicit_requirement_replaces_policy_lookup() {
    let app = TestApp::new().await;
    let body = json!({
        "method": "GET",
        "path": "/unlisted",
        "requirement": {"resource": "articles", "action": "update", "scope": "workspace"}
    });

    // EDITOR's (articles, *, workspace) only applies through a membership.
    assert!(!check(&app, check_request(EDITOR).workspace(WORKSPACE), &body).await);

    app.membership(EDITOR, 9, Role::Editor);
    assert!(check(&app, check_request(EDITOR).workspace(9), &body).await);
}

#[test_log::test(tokio::test)]
async fn check_without_actor_is_unauthorized() {
    let app = TestApp::new().await;
    let res = TestRequest::post("/api/authz/check")
        .json(&json!({"method": "GET", "path": "/notifications"}))
        .send(&app.service)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    assert!(res.json()["error"].is_string());

    // Unknown users are not identified either.
    TestRequest::post("/api/authz/check")
        .actor(404)
        .json(&json!({"method": "GET", "path": "/notifications"}))
        .send(&app.service)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[test_log::test(tokio::test)]
async fn malformed_inputs_are_bad_requests() {
    let app = TestApp::new().await;
    TestRequest::post("/api/authz/check")
        .actor(VIEWER)
        .json(&json!({"path": "/notifications"}))
        .send(&app.service)
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    TestRequest::post("/api/authz/check")
        .actor(VIEWER)
        .header(TENANT_ID_HEADER, "acme")
        .json(&json!({"method": "GET", "path": "/notifications"}))
        .send(&app.service)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[test_log::test(tokio::test)]
async fn unmatched_routes_follow_configured_policy() {
    let body = json!({"method": "GET", "path": "/not/in/the/table"});

    let open = TestApp::new().await;
    assert!(check(&open, check_request(VIEWER), &body).await);

    let closed = TestApp::with_unmatched(UnmatchedRoutePolicy::Deny).await;
    assert!(!check(&closed, check_request(VIEWER), &body).await);
    assert!(check(&closed, check_request(OWNER), &body).await);
}

#[test_log::test(tokio::test)]
async fn forward_auth_gates_the_forwarded_request() {
    let app = TestApp::new().await;

    TestRequest::get("/api/authz/forward")
        .actor(AUTHOR)
        .forwarded("GET", "/notifications?unread=true")
        .send(&app.service)
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let res = TestRequest::get("/api/authz/forward")
        .actor(VIEWER)
        .forwarded("get", "/notifications")
        .send(&app.service)
        .await
        .assert_status(StatusCode::FORBIDDEN);
    assert_eq!(res.json(), json!({"error": "Not permitted"}));

    TestRequest::get("/api/authz/forward")
        .forwarded("GET", "/notifications")
        .send(&app.service)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[test_log::test(tokio::test)]
async fn only_allows_are_audited() {
    let app = TestApp::new().await;

    TestRequest::get("/api/authz/forward")
        .actor(VIEWER)
        .forwarded("GET", "/notifications")
        .send(&app.service)
        .await
        .assert_status(StatusCode::FORBIDDEN);
    TestRequest::get("/api/authz/forward")
        .actor(EDITOR)
        .tenant(TENANT)
        .forwarded("GET", "/owner/queues")
        .send(&app.service)
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let entries = app.audit_entries(1).await;
    assert!(matches!(
        entries.as_slice(),
        [AuditEntry::Allowed(record)]
            if record.resource == "queues"
                && record.scope == Scope::Tenant
                && record.request_path.as_deref() == Some("/owner/queues")
    ));
}

#[test_log::test(tokio::test)]
async fn my_permissions_merge_global_and_workspace_roles() {
    let app = TestApp::new().await;
    app.membership(AUTHOR, WORKSPACE, Role::Editor);

    let res = TestRequest::get("/api/authz/me/permissions")
        .actor(AUTHOR)
        .tenant(TENANT)
        .workspace(WORKSPACE)
        .send(&app.service)
        .await
        .assert_status(StatusCode::OK);
    let body = res.json();

    assert_eq!(body["user_id"], json!(AUTHOR));
    assert_eq!(body["role"], json!("AUTHOR"));
    assert_eq!(body["workspace_id"], json!(WORKSPACE));
    let permissions = body["permissions"].as_array().expect("permissions array");
    assert!(permissions.contains(&json!({"resource": "notifications", "action": "read", "scope": "global"})));
    assert!(permissions.contains(&json!({"resource": "articles", "action": "*", "scope": "workspace"})));
    assert!(permissions.contains(&json!({"resource": "queues", "action": "read", "scope": "tenant"})));

    let res = TestRequest::get("/api/authz/me/permissions")
        .actor(AUTHOR)
        .send(&app.service)
        .await
        .assert_status(StatusCode::OK);
    let permissions = res.json()["permissions"].clone();
    assert_eq!(
        permissions,
        json!([{"resource": "notifications", "action": "read", "scope": "global"}])
    );
}

#[test_log::test(tokio::test)]
async fn owner_permissions_are_universal() {
    let app = TestApp::new().await;
    let res = TestRequest::get("/api/authz/me/permissions")
        .actor(OWNER)
        .send(&app.service)
        .await
        .assert_status(StatusCode::OK);
    assert_eq!(
        res.json()["permissions"],
        json!([{"resource": "*", "action": "*", "scope": "global"}])
    );
}
