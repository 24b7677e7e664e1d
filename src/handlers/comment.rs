use crate::error::{AppError, AppResult};
use crate::extract::{AppJson, AppPath};
use crate::middleware::AuthUser;
use crate::models::CommentModel;
use crate::response::ApiResponse;
use crate::services::comment::{CommentService, CommentThread};
use crate::services::notification::{kind, NotificationService};
use crate::services::video::VideoService;
use crate::websocket::hub::NotificationHub;
use axum::{response::IntoResponse, Extension};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCommentRequest {
    /// Top-level comment to reply to
    pub parent_id: Option<i32>,
    #[validate(length(min = 1, max = 10000))]
    pub content: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CommentResponse {
    pub id: i32,
    pub video_id: i32,
    pub member_id: i32,
    pub parent_id: Option<i32>,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<CommentModel> for CommentResponse {
    fn from(c: CommentModel) -> Self {
        Self {
            id: c.id,
            video_id: c.video_id,
            member_id: c.member_id,
            parent_id: c.parent_id,
            content: c.content,
            created_at: c.created_at.to_string(),
            updated_at: c.updated_at.to_string(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CommentThreadResponse {
    #[serde(flatten)]
    pub comment: CommentResponse,
    pub replies: Vec<CommentResponse>,
}

impl From<CommentThread> for CommentThreadResponse {
    fn from(t: CommentThread) -> Self {
        Self {
            comment: t.comment.into(),
            replies: t.replies.into_iter().map(CommentResponse::from).collect(),
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/videos/{id}/comments",
    params(("id" = i32, Path, description = "Video ID")),
    responses(
        (status = 200, description = "Top-level comments with their replies", body = Vec<CommentThreadResponse>),
    ),
    tag = "comments"
)]
pub async fn list_comments(
    Extension(db): Extension<DatabaseConnection>,
    AppPath(video_id): AppPath<i32>,
) -> AppResult<impl IntoResponse> {
    let service = CommentService::new(db);
    let threads: Vec<CommentThreadResponse> = service
        .list_for_video(video_id)
        .await?
        .into_iter()
        .map(CommentThreadResponse::from)
        .collect();
    Ok(ApiResponse::ok(threads))
}

#[utoipa::path(
    post,
    path = "/api/v1/videos/{id}/comments",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Video ID")),
    request_body = CreateCommentRequest,
    responses(
        (status = 201, description = "Comment created", body = CommentResponse),
        (status = 400, description = "Validation error or invalid parent", body = AppError),
        (status = 401, description = "Unauthorized", body = AppError),
        (status = 404, description = "Video not found", body = AppError),
    ),
    tag = "comments"
)]
pub async fn create_comment(
    Extension(db): Extension<DatabaseConnection>,
    Extension(hub): Extension<NotificationHub>,
    auth_user: AuthUser,
    AppPath(video_id): AppPath<i32>,
    AppJson(payload): AppJson<CreateCommentRequest>,
) -> AppResult<impl IntoResponse> {
    payload.validate()?;
    let content = payload.content.trim();
    if content.is_empty() {
        return Err(AppError::Validation("Content must not be blank".to_string()));
    }

    let service = CommentService::new(db.clone());
    let (comment, parent) = service
        .create(video_id, auth_user.member_id, payload.parent_id, content)
        .await?;

    let notifications = NotificationService::new(db.clone(), hub);
    match parent {
        Some(parent) => {
            notifications
                .notify(
                    parent.member_id,
                    auth_user.member_id,
                    kind::REPLY,
                    "comment",
                    comment.id,
                    "Someone replied to your comment",
                )
                .await?;
        }
        None => {
            if let Some(owner_id) = VideoService::new(db).owner_of(video_id).await? {
                notifications
                    .notify(
                        owner_id,
                        auth_user.member_id,
                        kind::COMMENT,
                        "comment",
                        comment.id,
                        "Someone commented on your video",
                    )
                    .await?;
            }
        }
    }

    Ok(ApiResponse::ok(CommentResponse::from(comment)).created())
}

#[utoipa::path(
    delete,
    path = "/api/v1/comments/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "Comment deleted", body = serde_json::Value),
        (status = 403, description = "Not the author", body = AppError),
        (status = 404, description = "Comment not found", body = AppError),
    ),
    tag = "comments"
)]
pub async fn delete_comment(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    AppPath(id): AppPath<i32>,
) -> AppResult<impl IntoResponse> {
    let service = CommentService::new(db);
    service.delete(id, &auth_user).await?;
    Ok(ApiResponse::ok(serde_json::json!({ "deleted": true })))
}
