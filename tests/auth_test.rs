mod common;

use serde_json::{json, Value};

async fn post_json(app: &common::TestApp, path: &str, payload: Value) -> (u16, Value) {
    let resp = app
        .client
        .post(app.url(path))
        .json(&payload)
        .send()
        .await
        .unwrap();
    let status = resp.status().as_u16();
    (status, resp.json().await.unwrap())
}

#[tokio::test]
async fn test_register_returns_tokens() {
    let app = common::spawn_app().await;

    let (status, body) = post_json(
        &app,
        "/auth/register",
        json!({
            "username": "alice",
            "email": "alice@test.com",
            "password": "password123"
        }),
    )
    .await;

    assert_eq!(status, 201);
    assert_eq!(body["success"], true);
    assert!(body["data"]["token"].as_str().is_some());
    assert!(body["data"]["refresh_token"].as_str().is_some());
    assert_eq!(body["data"]["username"], "alice");
}

#[tokio::test]
async fn test_register_validation() {
    let app = common::spawn_app().await;

    let cases = [
        json!({ "username": "ab", "email": "ab@test.com", "password": "password123" }),
        json!({ "username": "valid_name", "email": "not-an-email", "password": "password123" }),
        json!({ "username": "valid_name", "email": "v@test.com", "password": "short" }),
    ];

    for payload in cases {
        let (status, body) = post_json(&app, "/auth/register", payload).await;
        assert_eq!(status, 400);
        assert_eq!(body["success"], false);
    }
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let app = common::spawn_app().await;
    let user = common::create_test_user(&app, "dup").await;

    let (status, _) = post_json(
        &app,
        "/auth/register",
        json!({
            "username": user.username,
            "email": "someone_else@test.com",
            "password": "password123"
        }),
    )
    .await;
    assert_eq!(status, 409);
}

#[tokio::test]
async fn test_login_by_username_and_email() {
    let app = common::spawn_app().await;
    let user = common::create_test_user(&app, "login").await;

    let (status, body) = post_json(
        &app,
        "/auth/login",
        json!({ "username": user.username, "password": "test_password_123" }),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["member_id"], user.id);

    let (status, _) = post_json(
        &app,
        "/auth/login",
        json!({
            "username": format!("{}@test.com", user.username),
            "password": "test_password_123"
        }),
    )
    .await;
    assert_eq!(status, 200);

    let (status, body) = post_json(
        &app,
        "/auth/login",
        json!({ "username": user.username, "password": "wrong_password" }),
    )
    .await;
    assert_eq!(status, 401);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_me_returns_current_member() {
    let app = common::spawn_app().await;
    let user = common::create_test_user(&app, "me").await;

    let resp = app
        .client
        .get(app.url("/auth/me"))
        .bearer_auth(&user.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["id"], user.id);
    assert_eq!(body["data"]["role"], "member");
    assert!(body["data"].get("password_hash").is_none());

    let resp = app
        .client
        .get(app.url("/auth/me"))
        .bearer_auth("not-a-jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn test_refresh_rotates_and_rejects_replay() {
    let app = common::spawn_app().await;
    let user = common::create_test_user(&app, "refresh").await;

    let (status, body) = post_json(
        &app,
        "/auth/refresh",
        json!({ "refresh_token": user.refresh_token }),
    )
    .await;
    assert_eq!(status, 200);
    let rotated = body["data"]["refresh_token"].as_str().unwrap().to_string();
    assert_ne!(rotated, user.refresh_token);

    // The consumed token is gone
    let (status, _) = post_json(
        &app,
        "/auth/refresh",
        json!({ "refresh_token": user.refresh_token }),
    )
    .await;
    assert_eq!(status, 401);

    let (status, _) = post_json(&app, "/auth/refresh", json!({ "refresh_token": rotated })).await;
    assert_eq!(status, 200);
}

#[tokio::test]
async fn test_access_token_cannot_refresh() {
    let app = common::spawn_app().await;
    let user = common::create_test_user(&app, "wrongtype").await;

    let (status, _) = post_json(
        &app,
        "/auth/refresh",
        json!({ "refresh_token": user.token }),
    )
    .await;
    assert_eq!(status, 401);
}

#[tokio::test]
async fn test_logout_revokes_refresh_token() {
    let app = common::spawn_app().await;
    let user = common::create_test_user(&app, "logout").await;

    let resp = app
        .client
        .post(app.url("/auth/logout"))
        .bearer_auth(&user.token)
        .json(&json!({ "refresh_token": user.refresh_token }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let (status, _) = post_json(
        &app,
        "/auth/refresh",
        json!({ "refresh_token": user.refresh_token }),
    )
    .await;
    assert_eq!(status, 401);
}
