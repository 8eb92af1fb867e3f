//! Plan ownership decisions over HTTP.

use planroom::SystemRole;
use serde_json::json;

use super::harness::App;

#[tokio::test]
async fn owner_and_administrator_may_edit_others_may_not() {
    let app = App::start().await;
    let (_, owner) = app.user("owner@example.com", SystemRole::Regular).await;
    let (_, other) = app.user("other@example.com", SystemRole::Regular).await;
    let (_, admin) = app.user("admin@example.com", SystemRole::Administrator).await;

    let created = app
        .call(
            "POST",
            "/api/plans",
            Some(&owner),
            Some(json!({ "title": "  Food truck " })),
        )
        .await;
    let id = created.body["id"].as_str().unwrap().to_string();
    let path = format!("/api/plans/{id}");

    let by_other = app
        .call("PUT", &path, Some(&other), Some(json!({ "title": "Mine" })))
        .await;
    let by_owner = app
        .call("PUT", &path, Some(&owner), Some(json!({ "title": "Food truck v2" })))
        .await;
    let by_admin = app
        .call("PUT", &path, Some(&admin), Some(json!({ "title": "Reviewed" })))
        .await;
    let other_delete = app.call("DELETE", &path, Some(&other), None).await;
    let anonymous = app.call("DELETE", &path, None, None).await;

    app.stop().await;

    assert_eq!(created.status, 201);
    assert_eq!(created.body["title"], "Food truck");
    assert_eq!(by_other.status, 403);
    assert_eq!(by_other.body["error"], "Forbidden: cannot edit plan");
    assert_eq!(by_owner.status, 200);
    assert_eq!(by_admin.status, 200);
    assert_eq!(by_admin.body["title"], "Reviewed");
    assert_eq!(other_delete.status, 403);
    assert_eq!(anonymous.status, 401);
}

#[tokio::test]
async fn sharing_makes_plans_visible() {
    let app = App::start().await;
    let (_, owner) = app.user("owner@example.com", SystemRole::Regular).await;
    let (reader_user, reader) = app.user("reader@example.com", SystemRole::Regular).await;

    let created = app
        .call(
            "POST",
            "/api/plans",
            Some(&owner),
            Some(json!({ "title": "Bakery" })),
        )
        .await;
    let id = created.body["id"].as_str().unwrap().to_string();
    let shares = format!("/api/plans/{id}/shares");

    let before = app.call("GET", "/api/plans", Some(&reader), None).await;
    let reshare_by_reader = app
        .call(
            "POST",
            &shares,
            Some(&reader),
            Some(json!({ "email": "reader@example.com" })),
        )
        .await;
    let shared = app
        .call(
            "POST",
            &shares,
            Some(&owner),
            Some(json!({ "email": "Reader@Example.com" })),
        )
        .await;
    let to_self = app
        .call(
            "POST",
            &shares,
            Some(&owner),
            Some(json!({ "email": "owner@example.com" })),
        )
        .await;
    let to_nobody = app
        .call(
            "POST",
            &shares,
            Some(&owner),
            Some(json!({ "email": "ghost@example.com" })),
        )
        .await;
    let after = app.call("GET", "/api/plans", Some(&reader), None).await;

    app.stop().await;

    assert!(before.body.as_array().unwrap().is_empty());
    assert_eq!(reshare_by_reader.status, 403);
    assert_eq!(shared.status, 200);
    assert_eq!(shared.body["user_id"], reader_user.id.as_str());
    assert_eq!(shared.body["newly_shared"], true);
    assert_eq!(to_self.status, 400);
    assert_eq!(to_nobody.status, 404);
    assert_eq!(after.body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn deleting_plans() {
    let app = App::start().await;
    let (_, owner) = app.user("owner@example.com", SystemRole::Regular).await;

    let created = app
        .call(
            "POST",
            "/api/plans",
            Some(&owner),
            Some(json!({ "title": "Bakery" })),
        )
        .await;
    let path = format!("/api/plans/{}", created.body["id"].as_str().unwrap());

    let deleted = app.call("DELETE", &path, Some(&owner), None).await;
    let again = app.call("DELETE", &path, Some(&owner), None).await;
    let empty_title = app
        .call(
            "POST",
            "/api/plans",
            Some(&owner),
            Some(json!({ "title": "   " })),
        )
        .await;

    app.stop().await;

    assert_eq!(deleted.status, 204);
    assert_eq!(again.status, 404);
    assert_eq!(empty_title.status, 400);
}

/// A change that committed is reported as done even if the activity log
/// cannot be written.
#[tokio::test]
async fn activity_log_failure_does_not_fail_the_request() {
    let app = App::start().await;
    let (_, owner) = app.user("owner@example.com", SystemRole::Regular).await;
    let conn = planroom::db::connection(&app.db).unwrap();
    conn.execute("DROP TABLE activity_log", ()).await.unwrap();

    let created = app
        .call(
            "POST",
            "/api/plans",
            Some(&owner),
            Some(json!({ "title": "Bakery" })),
        )
        .await;
    let listed = app.call("GET", "/api/plans", Some(&owner), None).await;

    app.stop().await;

    assert_eq!(created.status, 201);
    assert_eq!(listed.body.as_array().unwrap().len(), 1);
}
