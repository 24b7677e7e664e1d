use crate::error::{AppError, AppResult};
use crate::extract::{AppJson, AppPath};
use crate::middleware::AuthUser;
use crate::models::VideoModel;
use crate::response::{ApiResponse, PaginatedResponse};
use crate::services::video::{VideoKind, VideoService};
use axum::{extract::Query, response::IntoResponse, Extension};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateVideoRequest {
    /// Title (1-200 characters)
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    /// Catalog kind, `video` when omitted
    #[serde(default)]
    pub kind: VideoKind,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VideoResponse {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub kind: String,
    /// Member who uploaded the entry
    pub created_by: i32,
    pub created_at: String,
    pub updated_at: String,
}

impl From<VideoModel> for VideoResponse {
    fn from(v: VideoModel) -> Self {
        Self {
            id: v.id,
            title: v.title,
            description: v.description,
            kind: v.kind,
            created_by: v.created_by,
            created_at: v.created_at.to_string(),
            updated_at: v.updated_at.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct VideoListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub kind: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/v1/videos",
    security(("jwt_token" = [])),
    request_body = CreateVideoRequest,
    responses(
        (status = 201, description = "Video created", body = VideoResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "videos"
)]
pub async fn create_video(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    AppJson(payload): AppJson<CreateVideoRequest>,
) -> AppResult<impl IntoResponse> {
    payload.validate()?;
    if payload.title.trim().is_empty() {
        return Err(AppError::Validation("Title must not be blank".to_string()));
    }

    let service = VideoService::new(db);
    let video = service
        .create(
            auth_user.member_id,
            &payload.title,
            payload.description.as_deref(),
            payload.kind,
        )
        .await?;

    Ok(ApiResponse::ok(VideoResponse::from(video)).created())
}

#[utoipa::path(
    get,
    path = "/api/v1/videos",
    params(
        ("page" = Option<u64>, Query, description = "Page number"),
        ("per_page" = Option<u64>, Query, description = "Items per page"),
        ("kind" = Option<String>, Query, description = "Filter: video, movie, tvshow, episode"),
    ),
    responses(
        (status = 200, description = "Videos, newest first", body = PaginatedResponse<VideoResponse>),
        (status = 400, description = "Unknown kind", body = AppError),
    ),
    tag = "videos"
)]
pub async fn list_videos(
    Extension(db): Extension<DatabaseConnection>,
    Query(params): Query<VideoListQuery>,
) -> AppResult<impl IntoResponse> {
    let page = params.page.unwrap_or(1).max(1);
    let per_page = params.per_page.unwrap_or(20).clamp(1, 100);
    let kind = params
        .kind
        .as_deref()
        .map(str::parse::<VideoKind>)
        .transpose()?;

    let service = VideoService::new(db);
    let (videos, total) = service.list(kind, page, per_page).await?;
    let items = videos.into_iter().map(VideoResponse::from).collect();

    Ok(ApiResponse::ok(PaginatedResponse::new(
        items, total, page, per_page,
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/videos/{id}",
    params(("id" = i32, Path, description = "Video ID")),
    responses(
        (status = 200, description = "Video", body = VideoResponse),
        (status = 404, description = "Video not found", body = AppError),
    ),
    tag = "videos"
)]
pub async fn get_video(
    Extension(db): Extension<DatabaseConnection>,
    AppPath(id): AppPath<i32>,
) -> AppResult<impl IntoResponse> {
    let service = VideoService::new(db);
    let video = service.get_by_id(id).await?;
    Ok(ApiResponse::ok(VideoResponse::from(video)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/videos/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Video ID")),
    responses(
        (status = 200, description = "Video deleted", body = serde_json::Value),
        (status = 403, description = "Not the owner", body = AppError),
        (status = 404, description = "Video not found", body = AppError),
    ),
    tag = "videos"
)]
pub async fn delete_video(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    AppPath(id): AppPath<i32>,
) -> AppResult<impl IntoResponse> {
    let service = VideoService::new(db);
    service.delete(id, &auth_user).await?;
    Ok(ApiResponse::ok(serde_json::json!({ "deleted": true })))
}
