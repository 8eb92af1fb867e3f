//! Admin console access and user/log management.

use planroom::SystemRole;
use serde_json::json;

use super::harness::App;

/// No token, a garbage token and a deactivated account are all 401, never 403.
#[tokio::test]
async fn unauthenticated_requests_get_401() {
    let app = App::start().await;
    let (user, token) = app.user("gone@example.com", SystemRole::Administrator).await;

    let missing = app.call("GET", "/api/admin", None, None).await;
    let garbage = app
        .call("GET", "/api/admin", Some("not.a.token"), None)
        .await;
    app.deactivate(&user.id).await;
    let deactivated = app.call("GET", "/api/admin", Some(&token), None).await;

    app.stop().await;

    assert_eq!(missing.status, 401);
    assert_eq!(garbage.status, 401);
    assert_eq!(deactivated.status, 401);
}

/// A regular user is authenticated but forbidden everywhere in the console.
#[tokio::test]
async fn regular_users_get_403() {
    let app = App::start().await;
    let (_, token) = app.user("regular@example.com", SystemRole::Regular).await;

    let mut statuses = Vec::new();
    for (method, path) in [
        ("GET", "/api/admin"),
        ("GET", "/api/admin/users"),
        ("GET", "/api/admin/logs"),
        ("DELETE", "/api/admin/logs"),
    ] {
        statuses.push(app.call(method, path, Some(&token), None).await.status);
    }
    let body = app.call("GET", "/api/admin/logs", Some(&token), None).await.body;

    app.stop().await;

    assert_eq!(statuses, vec![403, 403, 403, 403]);
    assert_eq!(body["error"], "Forbidden: cannot view logs");
}

#[tokio::test]
async fn administrators_manage_users() {
    let app = App::start().await;
    let (admin, token) = app.user("admin@example.com", SystemRole::Administrator).await;

    let overview = app.call("GET", "/api/admin", Some(&token), None).await;
    let created = app
        .call(
            "POST",
            "/api/admin/users",
            Some(&token),
            Some(json!({ "email": "New@Example.com" })),
        )
        .await;
    let new_id = created.body["id"].as_str().unwrap().to_string();
    let promoted = app
        .call(
            "PATCH",
            &format!("/api/admin/users/{new_id}"),
            Some(&token),
            Some(json!({ "role": "administrator" })),
        )
        .await;
    let duplicate = app
        .call(
            "POST",
            "/api/admin/users",
            Some(&token),
            Some(json!({ "email": "new@example.com" })),
        )
        .await;
    let self_demote = app
        .call(
            "PATCH",
            &format!("/api/admin/users/{}", admin.id),
            Some(&token),
            Some(json!({ "active": false })),
        )
        .await;
    let bad_role = app
        .call(
            "PATCH",
            &format!("/api/admin/users/{new_id}"),
            Some(&token),
            Some(json!({ "role": "superuser" })),
        )
        .await;
    let listed = app.call("GET", "/api/admin/users", Some(&token), None).await;

    app.stop().await;

    assert_eq!(overview.status, 200);
    assert_eq!(overview.body["users"], 1);
    assert_eq!(created.status, 201);
    assert_eq!(created.body["email"], "new@example.com");
    assert_eq!(created.body["role"], "regular");
    assert_eq!(promoted.status, 200);
    assert_eq!(promoted.body["role"], "administrator");
    assert_eq!(duplicate.status, 409);
    assert_eq!(self_demote.status, 409);
    assert_eq!(bad_role.status, 400);
    assert_eq!(listed.body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn administrators_view_and_clear_logs() {
    let app = App::start().await;
    let (_, admin) = app.user("admin@example.com", SystemRole::Administrator).await;
    let (_, regular) = app.user("regular@example.com", SystemRole::Regular).await;

    app.call(
        "POST",
        "/api/plans",
        Some(&regular),
        Some(json!({ "title": "Coffee cart" })),
    )
    .await;
    app.call(
        "POST",
        "/api/teams",
        Some(&regular),
        Some(json!({ "name": "Founders" })),
    )
    .await;

    let logs = app
        .call("GET", "/api/admin/logs?limit=1", Some(&admin), None)
        .await;
    let cleared = app.call("DELETE", "/api/admin/logs", Some(&admin), None).await;
    let after = app.call("GET", "/api/admin/logs", Some(&admin), None).await;

    app.stop().await;

    assert_eq!(logs.status, 200);
    let entries = logs.body.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["action"], "team.create");

    assert_eq!(cleared.body["deleted"], 2);
    let remaining = after.body.as_array().unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0]["action"], "logs.clear");
}
