use crate::error::{AppError, AppResult};
use crate::extract::{AppJson, AppPath};
use crate::middleware::AuthUser;
use crate::models::ReviewModel;
use crate::response::{ApiResponse, PaginatedResponse, PaginationQuery};
use crate::services::review::ReviewService;
use axum::{extract::Query, response::IntoResponse, Extension};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateReviewRequest {
    /// Star rating, 1 to 5
    pub rating: i16,
    #[validate(length(max = 10000))]
    pub content: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewResponse {
    pub id: i32,
    pub video_id: i32,
    pub member_id: i32,
    pub rating: i16,
    pub content: Option<String>,
    pub created_at: String,
}

impl From<ReviewModel> for ReviewResponse {
    fn from(r: ReviewModel) -> Self {
        Self {
            id: r.id,
            video_id: r.video_id,
            member_id: r.member_id,
            rating: r.rating,
            content: r.content,
            created_at: r.created_at.to_string(),
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/videos/{id}/reviews",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Video ID")),
    request_body = CreateReviewRequest,
    responses(
        (status = 201, description = "Review created", body = ReviewResponse),
        (status = 400, description = "Rating out of range", body = AppError),
        (status = 404, description = "Video not found", body = AppError),
        (status = 409, description = "Already reviewed", body = AppError),
    ),
    tag = "reviews"
)]
pub async fn create_review(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    AppPath(video_id): AppPath<i32>,
    AppJson(payload): AppJson<CreateReviewRequest>,
) -> AppResult<impl IntoResponse> {
    payload.validate()?;

    let service = ReviewService::new(db);
    let review = service
        .create(
            video_id,
            auth_user.member_id,
            payload.rating,
            payload.content.as_deref(),
        )
        .await?;

    Ok(ApiResponse::ok(ReviewResponse::from(review)).created())
}

#[utoipa::path(
    get,
    path = "/api/v1/videos/{id}/reviews",
    params(
        ("id" = i32, Path, description = "Video ID"),
        ("page" = Option<u64>, Query, description = "Page number"),
        ("per_page" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "Reviews, newest first", body = PaginatedResponse<ReviewResponse>),
    ),
    tag = "reviews"
)]
pub async fn list_reviews(
    Extension(db): Extension<DatabaseConnection>,
    AppPath(video_id): AppPath<i32>,
    Query(params): Query<PaginationQuery>,
) -> AppResult<impl IntoResponse> {
    let (page, per_page) = params.resolve();

    let service = ReviewService::new(db);
    let (reviews, total) = service.list_for_video(video_id, page, per_page).await?;
    let items = reviews.into_iter().map(ReviewResponse::from).collect();

    Ok(ApiResponse::ok(PaginatedResponse::new(
        items, total, page, per_page,
    )))
}
