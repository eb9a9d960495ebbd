//! Administrative endpoint integration tests.
//!
//! Role routes require `(roles, assign)` and cache routes `(cache, flush)`.
//! Only ADMIN holds those in the built-in matrix; OWNER holds everything.

use salvo::http::StatusCode;
use serde_json::json;

use super::helpers::*;
use warden_test::component::authz::{AuditEntry, Role};

fn queue_read(actor: i64) -> TestRequest {
    TestRequest::get("/api/authz/forward")
        .actor(actor)
        .tenant(TENANT)
        .forwarded("GET", "/owner/queues")
}

#[test_log::test(tokio::test)]
async fn global_assignment_takes_effect_on_next_request() {
    let app = TestApp::new().await;

    // Warm the cache with a deny.
    queue_read(VIEWER)
        .send(&app.service)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    TestRequest::post("/api/admin/roles/assign")
        .actor(ADMIN)
        .json(&json!({"target_user_id": VIEWER, "global_role": "EDITOR"}))
        .send(&app.service)
        .await
        .assert_status(StatusCode::NO_CONTENT);

    queue_read(VIEWER)
        .send(&app.service)
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let entries = app.store.audit_entries().await;
    assert!(entries.iter().any(|entry| matches!(
        entry,
        AuditEntry::RoleChange(change)
            if change.subject_id.get() == VIEWER && change.new_role == Some(Role::Editor)
    )));
}

#[test_log::test(tokio::test)]
async fn membership_assignment_and_revocation() {
    let app = TestApp::new().await;
    let edit = || {
        TestRequest::get("/api/authz/forward")
            .actor(VIEWER)
            .workspace(WORKSPACE)
            .forwarded("PATCH", "/workspaces/7/articles/3")
    };

    edit().send(&app.service).await.assert_status(StatusCode::FORBIDDEN);

    TestRequest::post("/api/admin/roles/assign")
        .actor(ADMIN)
        .json(&json!({
            "target_user_id": VIEWER,
            "workspace_role": "AUTHOR",
            "workspace_id": WORKSPACE
        }))
        .send(&app.service)
        .await
        .assert_status(StatusCode::NO_CONTENT);
    edit().send(&app.service).await.assert_status(StatusCode::NO_CONTENT);

    TestRequest::delete(&format!("/api/admin/roles/{VIEWER}/workspaces/{WORKSPACE}"))
        .actor(ADMIN)
        .send(&app.service)
        .await
        .assert_status(StatusCode::NO_CONTENT);
    edit().send(&app.service).await.assert_status(StatusCode::FORBIDDEN);

    TestRequest::delete(&format!("/api/admin/roles/{VIEWER}/workspaces/{WORKSPACE}"))
        .actor(ADMIN)
        .send(&app.service)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[test_log::test(tokio::test)]
async fn role_routes_require_roles_assign() {
    let app = TestApp::new().await;

    let res = TestRequest::post("/api/admin/roles/assign")
        .actor(EDITOR)
        .json(&json!({"target_user_id": VIEWER, "global_role": "ADMIN"}))
        .send(&app.service)
        .await
        .assert_status(StatusCode::FORBIDDEN);
    assert_eq!(res.json(), json!({"error": "Not permitted"}));

    TestRequest::post("/api/admin/roles/assign")
        .json(&json!({"target_user_id": VIEWER, "global_role": "ADMIN"}))
        .send(&app.service)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    assert!(app.store.audit_entries().await.is_empty());
}

#[test_log::test(tokio::test)]
async fn only_owners_grant_owner() {
    let app = TestApp::new().await;
    let grant = json!({"target_user_id": ADMIN, "global_role": "OWNER"});

    let res = TestRequest::post("/api/admin/roles/assign")
        .actor(ADMIN)
        .json(&grant)
        .send(&app.service)
        .await
        .assert_status(StatusCode::FORBIDDEN);
    assert_eq!(res.json(), json!({"error": "Not permitted"}));

    TestRequest::post("/api/admin/roles/assign")
        .actor(OWNER)
        .json(&grant)
        .send(&app.service)
        .await
        .assert_status(StatusCode::NO_CONTENT);
}

#[test_log::test(tokio::test)]
async fn invalid_assignments_are_rejected() {
    let app = TestApp::new().await;
    let assign = |body: serde_json::Value| {
        TestRequest::post("/api/admin/roles/assign")
            .actor(ADMIN)
            .json(&body)
    };

    assign(json!({"global_role": "EDITOR"}))
        .send(&app.service)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    assign(json!({"target_user_id": VIEWER}))
        .send(&app.service)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    assign(json!({"target_user_id": VIEWER, "workspace_role": "AUTHOR"}))
        .send(&app.service)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    assign(json!({"target_user_id": VIEWER, "global_role": "AUDITOR"}))
        .send(&app.service)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    assign(json!({"target_user_id": 404, "global_role": "EDITOR"}))
        .send(&app.service)
        .await
        .assert_status(StatusCode::NOT_FOUND);

    TestRequest::delete("/api/admin/roles/someone/workspaces/7")
        .actor(ADMIN)
        .send(&app.service)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[test_log::test(tokio::test)]
async fn cache_flush_endpoints() {
    let app = TestApp::new().await;

    TestRequest::post("/api/admin/cache/flush")
        .actor(ADMIN)
        .json(&json!({"user_id": VIEWER, "tenant_id": TENANT}))
        .send(&app.service)
        .await
        .assert_status(StatusCode::NO_CONTENT);
    TestRequest::delete(&format!("/api/admin/cache/{VIEWER}"))
        .actor(ADMIN)
        .send(&app.service)
        .await
        .assert_status(StatusCode::NO_CONTENT);

    TestRequest::post("/api/admin/cache/flush")
        .actor(ADMIN)
        .json(&json!({"tenant_id": TENANT}))
        .send(&app.service)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    TestRequest::delete("/api/admin/cache/everyone")
        .actor(ADMIN)
        .send(&app.service)
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    TestRequest::delete(&format!("/api/admin/cache/{VIEWER}"))
        .actor(AUTHOR)
        .send(&app.service)
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[test_log::test(tokio::test)]
async fn point_flush_exposes_direct_store_changes() {
    let app = TestApp::new().await;

    queue_read(AUTHOR)
        .send(&app.service)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    // Written behind the engine's back, so the cached deny still answers.
    app.store
        .insert_actor(warden_test::component::types::UserId::new(AUTHOR), Role::Editor);
    queue_read(AUTHOR)
        .send(&app.service)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    TestRequest::post("/api/admin/cache/flush")
        .actor(ADMIN)
        .json(&json!({"user_id": AUTHOR, "tenant_id": TENANT}))
        .send(&app.service)
        .await
        .assert_status(StatusCode::NO_CONTENT);
    queue_read(AUTHOR)
        .send(&app.service)
        .await
        .assert_status(StatusCode::NO_CONTENT);
}
