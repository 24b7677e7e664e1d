//! The authenticated member's notification inbox. Rows are served exactly as
//! stored; the same shape is pushed over `/ws`.

use crate::error::{AppError, AppResult};
use crate::extract::AppPath;
use crate::middleware::AuthUser;
use crate::models::NotificationModel;
use crate::response::{ApiResponse, PaginatedResponse, PaginationQuery};
use crate::services::notification::NotificationService;
use crate::websocket::hub::NotificationHub;
use axum::{extract::Query, response::IntoResponse, Extension};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct UnreadCount {
    pub count: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MarkedRead {
    pub marked_read: u64,
}

fn inbox(db: DatabaseConnection, hub: NotificationHub) -> NotificationService {
    NotificationService::new(db, hub)
}

#[utoipa::path(
    get,
    path = "/api/v1/notifications",
    security(("jwt_token" = [])),
    params(
        ("page" = Option<u64>, Query, description = "Page number, from 1"),
        ("per_page" = Option<u64>, Query, description = "Items per page, at most 100"),
    ),
    responses(
        (status = 200, description = "Newest first", body = PaginatedResponse<NotificationModel>),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "notifications"
)]
pub async fn list_notifications(
    Extension(db): Extension<DatabaseConnection>,
    Extension(hub): Extension<NotificationHub>,
    auth_user: AuthUser,
    Query(params): Query<PaginationQuery>,
) -> AppResult<impl IntoResponse> {
    let (page, per_page) = params.resolve();
    let (items, total) = inbox(db, hub)
        .list_for_member(auth_user.member_id, page, per_page)
        .await?;
    Ok(ApiResponse::ok(PaginatedResponse::new(items, total, page, per_page)))
}

#[utoipa::path(
    get,
    path = "/api/v1/notifications/unread-count",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "Unread notification count", body = UnreadCount),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "notifications"
)]
pub async fn unread_count(
    Extension(db): Extension<DatabaseConnection>,
    Extension(hub): Extension<NotificationHub>,
    auth_user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let count = inbox(db, hub).unread_count(auth_user.member_id).await?;
    Ok(ApiResponse::ok(UnreadCount { count }))
}

/// Marks one notification read and answers with what is still unread, so a
/// client can refresh its badge without a second call.
#[utoipa::path(
    put,
    path = "/api/v1/notifications/{id}/read",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Remaining unread count", body = UnreadCount),
        (status = 403, description = "Not the recipient", body = AppError),
        (status = 404, description = "Notification not found", body = AppError),
    ),
    tag = "notifications"
)]
pub async fn mark_read(
    Extension(db): Extension<DatabaseConnection>,
    Extension(hub): Extension<NotificationHub>,
    auth_user: AuthUser,
    AppPath(id): AppPath<i32>,
) -> AppResult<impl IntoResponse> {
    let service = inbox(db, hub);
    service.mark_read(id, auth_user.member_id).await?;
    let count = service.unread_count(auth_user.member_id).await?;
    Ok(ApiResponse::with_message(UnreadCount { count }, "Notification marked as read"))
}

#[utoipa::path(
    put,
    path = "/api/v1/notifications/read-all",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "Number of notifications marked read", body = MarkedRead),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "notifications"
)]
pub async fn mark_all_read(
    Extension(db): Extension<DatabaseConnection>,
    Extension(hub): Extension<NotificationHub>,
    auth_user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let marked_read = inbox(db, hub).mark_all_read(auth_user.member_id).await?;
    Ok(ApiResponse::ok(MarkedRead { marked_read }))
}
