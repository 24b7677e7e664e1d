mod common;

use serde_json::{json, Value};

#[tokio::test]
async fn test_comment_notifies_video_owner() {
    let app = common::spawn_app().await;
    let owner = common::create_test_user(&app, "owner").await;
    let viewer = common::create_test_user(&app, "viewer").await;
    let video_id = common::create_test_video(&app, &owner.token).await;

    let comment_id = common::create_test_comment(&app, &viewer.token, video_id, None).await;
    assert!(comment_id > 0);
    assert_eq!(common::notification_count(&app, owner.id, "comment").await, 1);

    // Own comments are silent
    common::create_test_comment(&app, &owner.token, video_id, None).await;
    assert_eq!(common::notification_count(&app, owner.id, "comment").await, 1);
}

#[tokio::test]
async fn test_reply_notifies_parent_author() {
    let app = common::spawn_app().await;
    let owner = common::create_test_user(&app, "owner").await;
    let author = common::create_test_user(&app, "author").await;
    let replier = common::create_test_user(&app, "replier").await;
    let video_id = common::create_test_video(&app, &owner.token).await;

    let root = common::create_test_comment(&app, &author.token, video_id, None).await;
    common::create_test_comment(&app, &replier.token, video_id, Some(root)).await;

    assert_eq!(common::notification_count(&app, author.id, "reply").await, 1);
    // Replies do not notify the video owner a second time
    assert_eq!(common::notification_count(&app, owner.id, "comment").await, 1);
}

#[tokio::test]
async fn test_list_comments_groups_replies() {
    let app = common::spawn_app().await;
    let owner = common::create_test_user(&app, "owner").await;
    let video_id = common::create_test_video(&app, &owner.token).await;

    let first = common::create_test_comment(&app, &owner.token, video_id, None).await;
    let second = common::create_test_comment(&app, &owner.token, video_id, None).await;
    let reply = common::create_test_comment(&app, &owner.token, video_id, Some(first)).await;

    let resp = app
        .client
        .get(app.url(&format!("/videos/{}/comments", video_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let threads = body["data"].as_array().unwrap();
    assert_eq!(threads.len(), 2);
    assert_eq!(threads[0]["id"], first);
    assert_eq!(threads[0]["replies"][0]["id"], reply);
    assert_eq!(threads[1]["id"], second);
    assert!(threads[1]["replies"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_invalid_comments_are_rejected() {
    let app = common::spawn_app().await;
    let owner = common::create_test_user(&app, "owner").await;
    let video_id = common::create_test_video(&app, &owner.token).await;
    let other_video = common::create_test_video(&app, &owner.token).await;
    let root = common::create_test_comment(&app, &owner.token, video_id, None).await;
    let reply = common::create_test_comment(&app, &owner.token, video_id, Some(root)).await;

    let post = |video: i32, payload: Value| {
        let app = &app;
        let token = owner.token.clone();
        async move {
            app.client
                .post(app.url(&format!("/videos/{}/comments", video)))
                .bearer_auth(token)
                .json(&payload)
                .send()
                .await
                .unwrap()
                .status()
                .as_u16()
        }
    };

    assert_eq!(post(video_id, json!({ "content": "" })).await, 400);
    assert_eq!(post(video_id, json!({ "content": "x", "parent_id": reply })).await, 400);
    assert_eq!(post(other_video, json!({ "content": "x", "parent_id": root })).await, 400);
    assert_eq!(post(video_id, json!({ "content": "x", "parent_id": 999999 })).await, 400);
    assert_eq!(post(999999, json!({ "content": "x" })).await, 404);
}

#[tokio::test]
async fn test_delete_comment_permissions() {
    let app = common::spawn_app().await;
    let owner = common::create_test_user(&app, "owner").await;
    let author = common::create_test_user(&app, "author").await;
    let video_id = common::create_test_video(&app, &owner.token).await;
    let comment_id = common::create_test_comment(&app, &author.token, video_id, None).await;

    let resp = app
        .client
        .delete(app.url(&format!("/comments/{}", comment_id)))
        .bearer_auth(&owner.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let resp = app
        .client
        .delete(app.url(&format!("/comments/{}", comment_id)))
        .bearer_auth(&author.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = app
        .client
        .delete(app.url(&format!("/comments/{}", comment_id)))
        .bearer_auth(&author.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}
