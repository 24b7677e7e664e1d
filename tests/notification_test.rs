mod common;

use serde_json::{json, Value};

async fn like(app: &common::TestApp, token: &str, video_id: i32) {
    let resp = app
        .client
        .post(app.url("/likes-dislikes"))
        .bearer_auth(token)
        .json(&json!({ "target_id": video_id, "target_type": "video", "is_like": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
}

async fn get_data(app: &common::TestApp, token: &str, path: &str) -> Value {
    let resp = app
        .client
        .get(app.url(path))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    body["data"].clone()
}

#[tokio::test]
async fn test_like_notification_is_listed() {
    let app = common::spawn_app().await;
    let owner = common::create_test_user(&app, "owner").await;
    let fan = common::create_test_user(&app, "fan").await;
    let video_id = common::create_test_video(&app, &owner.token).await;

    like(&app, &fan.token, video_id).await;

    let data = get_data(&app, &owner.token, "/notifications").await;
    assert_eq!(data["total"], 1);
    let item = &data["items"][0];
    assert_eq!(item["kind"], "like");
    assert_eq!(item["recipient_id"], owner.id);
    assert_eq!(item["sender_id"], fan.id);
    assert_eq!(item["reference_type"], "video");
    assert_eq!(item["reference_id"], video_id);
    assert_eq!(item["is_read"], false);

    let data = get_data(&app, &owner.token, "/notifications/unread-count").await;
    assert_eq!(data["count"], 1);

    // The liker has nothing
    let data = get_data(&app, &fan.token, "/notifications").await;
    assert_eq!(data["total"], 0);
}

#[tokio::test]
async fn test_mark_read_checks_recipient() {
    let app = common::spawn_app().await;
    let owner = common::create_test_user(&app, "owner").await;
    let fan = common::create_test_user(&app, "fan").await;
    let video_id = common::create_test_video(&app, &owner.token).await;
    like(&app, &fan.token, video_id).await;

    let data = get_data(&app, &owner.token, "/notifications").await;
    let id = data["items"][0]["id"].as_i64().unwrap();

    let resp = app
        .client
        .put(app.url(&format!("/notifications/{}/read", id)))
        .bearer_auth(&fan.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let resp = app
        .client
        .put(app.url("/notifications/999999/read"))
        .bearer_auth(&owner.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let resp = app
        .client
        .put(app.url(&format!("/notifications/{}/read", id)))
        .bearer_auth(&owner.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["count"], 0);

    let data = get_data(&app, &owner.token, "/notifications/unread-count").await;
    assert_eq!(data["count"], 0);

    let resp = app
        .client
        .put(app.url("/notifications/abc/read"))
        .bearer_auth(&owner.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_mark_read_reports_remaining_unread() {
    let app = common::spawn_app().await;
    let owner = common::create_test_user(&app, "owner").await;
    let video_id = common::create_test_video(&app, &owner.token).await;
    for i in 0..2 {
        let fan = common::create_test_user(&app, &format!("fan{i}")).await;
        like(&app, &fan.token, video_id).await;
    }

    let data = get_data(&app, &owner.token, "/notifications").await;
    let id = data["items"][0]["id"].as_i64().unwrap();

    let resp = app
        .client
        .put(app.url(&format!("/notifications/{}/read", id)))
        .bearer_auth(&owner.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["count"], 1);
}

#[tokio::test]
async fn test_mark_all_read() {
    let app = common::spawn_app().await;
    let owner = common::create_test_user(&app, "owner").await;
    let video_id = common::create_test_video(&app, &owner.token).await;

    for i in 0..3 {
        let fan = common::create_test_user(&app, &format!("fan{i}")).await;
        like(&app, &fan.token, video_id).await;
    }

    let resp = app
        .client
        .put(app.url("/notifications/read-all"))
        .bearer_auth(&owner.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["marked_read"], 3);

    let data = get_data(&app, &owner.token, "/notifications/unread-count").await;
    assert_eq!(data["count"], 0);
}

#[tokio::test]
async fn test_notifications_require_auth() {
    let app = common::spawn_app().await;
    let resp = app
        .client
        .get(app.url("/notifications"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}
