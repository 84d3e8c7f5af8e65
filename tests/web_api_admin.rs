//! Web API Admin Tests
//!
//! Integration tests for user management and platform statistics.

mod common;

use axum::http::header::AUTHORIZATION;
use axum::http::StatusCode;
use serde_json::{json, Value};

use common::{bearer, create_test_app, register_admin, register_user, upload_text};

// ============================================================================
// Access Control Tests
// ============================================================================

#[tokio::test]
async fn test_admin_routes_forbidden_for_members() {
    let app = create_test_app().await;
    let (alice_id, alice) = register_user(&app.server, "Alice", "alice@example.com").await;

    for response in [
        app.server
            .get("/api/admin/users")
            .add_header(AUTHORIZATION, bearer(&alice))
            .await,
        app.server
            .get("/api/admin/stats")
            .add_header(AUTHORIZATION, bearer(&alice))
            .await,
        app.server
            .put(&format!("/api/admin/users/{alice_id}/role"))
            .add_header(AUTHORIZATION, bearer(&alice))
            .json(&json!({ "role": "admin" }))
            .await,
        app.server
            .delete(&format!("/api/admin/users/{alice_id}"))
            .add_header(AUTHORIZATION, bearer(&alice))
            .await,
    ] {
        response.assert_status(StatusCode::FORBIDDEN);
        assert_eq!(
            response.json::<Value>()["message"],
            "Not authorized as an admin"
        );
    }
}

#[tokio::test]
async fn test_admin_routes_require_token() {
    let app = create_test_app().await;

    let response = app.server.get("/api/admin/stats").await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_member_forbidden_even_with_invalid_role_body() {
    let app = create_test_app().await;
    let (alice_id, alice) = register_user(&app.server, "Alice", "alice@example.com").await;

    let response = app
        .server
        .put(&format!("/api/admin/users/{alice_id}/role"))
        .add_header(AUTHORIZATION, bearer(&alice))
        .json(&json!({ "role": "superuser" }))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_member_forbidden_with_malformed_role_body() {
    let app = create_test_app().await;
    let (alice_id, alice) = register_user(&app.server, "Alice", "alice@example.com").await;
    let (_, admin) = register_admin(&app, "Admin", "admin@example.com").await;

    let response = app
        .server
        .put(&format!("/api/admin/users/{alice_id}/role"))
        .add_header(AUTHORIZATION, bearer(&alice))
        .json(&json!({ "role": 5 }))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);
    assert_eq!(
        response.json::<Value>()["message"],
        "Not authorized as an admin"
    );

    // An administrator sending the same body gets the body error.
    let response = app
        .server
        .put(&format!("/api/admin/users/{alice_id}/role"))
        .add_header(AUTHORIZATION, bearer(&admin))
        .json(&json!({ "role": 5 }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(response.json::<Value>()["message"]
        .as_str()
        .unwrap()
        .starts_with("Invalid JSON"));
}

#[tokio::test]
async fn test_promotion_takes_effect_on_existing_token() {
    let app = create_test_app().await;
    let (alice_id, alice) = register_user(&app.server, "Alice", "alice@example.com").await;
    let (_, admin) = register_admin(&app, "Admin", "admin@example.com").await;

    app.server
        .get("/api/admin/stats")
        .add_header(AUTHORIZATION, bearer(&alice))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    app.server
        .put(&format!("/api/admin/users/{alice_id}/role"))
        .add_header(AUTHORIZATION, bearer(&admin))
        .json(&json!({ "role": "admin" }))
        .await
        .assert_status_ok();

    // Same token, role re-read from the store.
    app.server
        .get("/api/admin/stats")
        .add_header(AUTHORIZATION, bearer(&alice))
        .await
        .assert_status_ok();
}

// ============================================================================
// User Listing Tests
// ============================================================================

#[tokio::test]
async fn test_list_users_with_usage() {
    let app = create_test_app().await;
    let (_, alice) = register_user(&app.server, "Alice", "alice@example.com").await;
    let (_, admin) = register_admin(&app, "Admin", "admin@example.com").await;
    upload_text(&app.server, &alice, "a.txt", "12345").await;
    upload_text(&app.server, &alice, "b.txt", "123").await;

    let response = app
        .server
        .get("/api/admin/users")
        .add_header(AUTHORIZATION, bearer(&admin))
        .await;

    response.assert_status_ok();
    let users = response.json::<Value>();
    let users = users.as_array().unwrap();
    assert_eq!(users.len(), 2);

    let alice_row = users
        .iter()
        .find(|u| u["email"] == "alice@example.com")
        .unwrap();
    assert_eq!(alice_row["role"], "user");
    assert_eq!(alice_row["fileCount"], 2);
    assert_eq!(alice_row["totalSize"], 8);
    assert!(alice_row.get("password").is_none());

    let admin_row = users
        .iter()
        .find(|u| u["email"] == "admin@example.com")
        .unwrap();
    assert_eq!(admin_row["role"], "admin");
    assert_eq!(admin_row["fileCount"], 0);
    assert_eq!(admin_row["totalSize"], 0);
}

// ============================================================================
// Role Update Tests
// ============================================================================

#[tokio::test]
async fn test_update_role_promote_and_demote() {
    let app = create_test_app().await;
    let (alice_id, _) = register_user(&app.server, "Alice", "alice@example.com").await;
    let (_, admin) = register_admin(&app, "Admin", "admin@example.com").await;

    let response = app
        .server
        .put(&format!("/api/admin/users/{alice_id}/role"))
        .add_header(AUTHORIZATION, bearer(&admin))
        .json(&json!({ "role": "admin" }))
        .await;
    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["id"], alice_id);
    assert_eq!(body["role"], "admin");
    assert_eq!(body["message"], "User role updated to admin");

    let response = app
        .server
        .put(&format!("/api/admin/users/{alice_id}/role"))
        .add_header(AUTHORIZATION, bearer(&admin))
        .json(&json!({ "role": "user" }))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["role"], "user");
}

#[tokio::test]
async fn test_update_role_invalid_value() {
    let app = create_test_app().await;
    let (alice_id, _) = register_user(&app.server, "Alice", "alice@example.com").await;
    let (_, admin) = register_admin(&app, "Admin", "admin@example.com").await;

    let response = app
        .server
        .put(&format!("/api/admin/users/{alice_id}/role"))
        .add_header(AUTHORIZATION, bearer(&admin))
        .json(&json!({ "role": "superuser" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>()["message"],
        "Invalid role. Must be \"user\" or \"admin\""
    );
}

#[tokio::test]
async fn test_update_role_self_demotion_rejected() {
    let app = create_test_app().await;
    let (admin_id, admin) = register_admin(&app, "Admin", "admin@example.com").await;

    let response = app
        .server
        .put(&format!("/api/admin/users/{admin_id}/role"))
        .add_header(AUTHORIZATION, bearer(&admin))
        .json(&json!({ "role": "user" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>()["message"],
        "You cannot demote yourself"
    );

    // Still an administrator.
    app.server
        .get("/api/admin/stats")
        .add_header(AUTHORIZATION, bearer(&admin))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_update_role_unknown_user() {
    let app = create_test_app().await;
    let (_, admin) = register_admin(&app, "Admin", "admin@example.com").await;

    let response = app
        .server
        .put("/api/admin/users/999/role")
        .add_header(AUTHORIZATION, bearer(&admin))
        .json(&json!({ "role": "admin" }))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["message"], "User not found");
}

// ============================================================================
// User Deletion Tests
// ============================================================================

#[tokio::test]
async fn test_delete_user_cascades_files() {
    let app = create_test_app().await;
    let (alice_id, alice) = register_user(&app.server, "Alice", "alice@example.com").await;
    let (_, admin) = register_admin(&app, "Admin", "admin@example.com").await;
    upload_text(&app.server, &alice, "a.txt", "one").await;
    upload_text(&app.server, &alice, "b.txt", "two").await;
    assert_eq!(app.blobs.len(), 2);

    let response = app
        .server
        .delete(&format!("/api/admin/users/{alice_id}"))
        .add_header(AUTHORIZATION, bearer(&admin))
        .await;

    response.assert_status_ok();
    response.assert_json(&json!({
        "message": "User and all their files deleted successfully",
        "deletedFiles": 2
    }));
    assert!(app.blobs.is_empty());

    // The deleted user's token no longer works.
    let response = app
        .server
        .get("/api/users/profile")
        .add_header(AUTHORIZATION, bearer(&alice))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.json::<Value>()["message"],
        "Not authorized, user not found"
    );

    let files = app
        .server
        .get("/api/files/all")
        .add_header(AUTHORIZATION, bearer(&admin))
        .await
        .json::<Value>();
    assert!(files.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_user_survives_blob_failures() {
    let app = create_test_app().await;
    let (alice_id, alice) = register_user(&app.server, "Alice", "alice@example.com").await;
    let (_, admin) = register_admin(&app, "Admin", "admin@example.com").await;
    upload_text(&app.server, &alice, "a.txt", "one").await;
    app.blobs.fail_deletes(true);

    let response = app
        .server
        .delete(&format!("/api/admin/users/{alice_id}"))
        .add_header(AUTHORIZATION, bearer(&admin))
        .await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["deletedFiles"], 1);
}

#[tokio::test]
async fn test_delete_self_rejected() {
    let app = create_test_app().await;
    let (admin_id, admin) = register_admin(&app, "Admin", "admin@example.com").await;

    let response = app
        .server
        .delete(&format!("/api/admin/users/{admin_id}"))
        .add_header(AUTHORIZATION, bearer(&admin))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>()["message"],
        "You cannot delete yourself"
    );
}

#[tokio::test]
async fn test_delete_unknown_user() {
    let app = create_test_app().await;
    let (_, admin) = register_admin(&app, "Admin", "admin@example.com").await;

    let response = app
        .server
        .delete("/api/admin/users/999")
        .add_header(AUTHORIZATION, bearer(&admin))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["message"], "User not found");
}

// ============================================================================
// Statistics Tests
// ============================================================================

#[tokio::test]
async fn test_stats() {
    let app = create_test_app().await;
    let (_, alice) = register_user(&app.server, "Alice", "alice@example.com").await;
    let (_, bob) = register_user(&app.server, "Bob", "bob@example.com").await;
    let (_, admin) = register_admin(&app, "Admin", "admin@example.com").await;
    upload_text(&app.server, &alice, "a.txt", "1234").await;
    upload_text(&app.server, &alice, "b.txt", "12").await;
    upload_text(&app.server, &bob, "c.txt", "123456").await;

    let response = app
        .server
        .get("/api/admin/stats")
        .add_header(AUTHORIZATION, bearer(&admin))
        .await;

    response.assert_status_ok();
    let stats = response.json::<Value>();
    assert_eq!(stats["totalUsers"], 3);
    assert_eq!(stats["totalAdmins"], 1);
    assert_eq!(stats["totalRegularUsers"], 2);
    assert_eq!(stats["totalFiles"], 3);
    assert_eq!(stats["totalStorage"], 12);
    assert_eq!(stats["recentUsers"], 3);
    assert_eq!(stats["recentFiles"], 3);
    assert_eq!(stats["averageFilesPerUser"], 1.0);
}
