use crate::error::{AppError, AppResult};
use crate::extract::{AppJson, AppPath};
use crate::middleware::AuthUser;
use crate::models::ReactionModel;
use crate::response::ApiResponse;
use crate::services::cache::CacheService;
use crate::services::reaction::{
    ReactionCounts, ReactionService, ReactionState, TargetType, ToggleOutcome, UserReaction,
};
use crate::websocket::hub::NotificationHub;
use axum::{
    response::{IntoResponse, Response},
    Extension,
};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Every field is optional at the wire level so a missing one reports a
/// readable 400 instead of a generic body rejection.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ToggleReactionRequest {
    pub target_id: Option<i32>,
    /// One of video, movie, tvshow, episode, comment, review, comment_reply
    pub target_type: Option<String>,
    /// `true` for like, `false` for dislike
    pub is_like: Option<bool>,
}

struct ToggleArgs {
    target_id: i32,
    target_type: TargetType,
    is_like: bool,
}

impl ToggleReactionRequest {
    fn into_args(self) -> AppResult<ToggleArgs> {
        let (Some(target_id), Some(target_type)) = (self.target_id, self.target_type) else {
            return Err(AppError::Validation(
                "target_id and target_type are required".to_string(),
            ));
        };
        let is_like = self
            .is_like
            .ok_or_else(|| AppError::Validation("is_like must be a boolean".to_string()))?;

        Ok(ToggleArgs {
            target_id,
            target_type: target_type.parse()?,
            is_like,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReactionResponse {
    pub reaction: ReactionModel,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RemovedResponse {
    pub removed: bool,
}

fn service(db: DatabaseConnection, hub: NotificationHub, cache: CacheService) -> ReactionService {
    ReactionService::new(db, hub, cache)
}

#[utoipa::path(
    post,
    path = "/api/v1/likes-dislikes",
    security(("jwt_token" = [])),
    request_body = ToggleReactionRequest,
    responses(
        (status = 201, description = "Reaction added or switched", body = ReactionResponse),
        (status = 200, description = "Same reaction repeated, reaction removed", body = RemovedResponse),
        (status = 400, description = "Missing or invalid argument", body = AppError),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "reactions"
)]
pub async fn toggle_reaction(
    Extension(db): Extension<DatabaseConnection>,
    Extension(hub): Extension<NotificationHub>,
    Extension(cache): Extension<CacheService>,
    auth_user: AuthUser,
    AppJson(payload): AppJson<ToggleReactionRequest>,
) -> AppResult<Response> {
    let args = payload.into_args()?;

    let outcome = service(db, hub, cache)
        .toggle(
            auth_user.member_id,
            args.target_id,
            args.target_type,
            args.is_like,
        )
        .await?;

    let response = match outcome {
        ToggleOutcome::Removed => {
            ApiResponse::with_message(RemovedResponse { removed: true }, "Reaction removed")
                .into_response()
        }
        ToggleOutcome::Saved { reaction, previous } => {
            let message = if previous == ReactionState::Neutral {
                "Reaction added"
            } else {
                "Reaction updated"
            };
            ApiResponse::with_message(ReactionResponse { reaction }, message)
                .created()
                .into_response()
        }
    };

    Ok(response)
}

#[utoipa::path(
    get,
    path = "/api/v1/likes-dislikes/{target_type}/{target_id}",
    params(
        ("target_type" = String, Path, description = "Target type"),
        ("target_id" = i32, Path, description = "Target ID"),
    ),
    responses(
        (status = 200, description = "Like and dislike totals", body = ReactionCounts),
        (status = 400, description = "Unknown target type or non-numeric id", body = AppError),
    ),
    tag = "reactions"
)]
pub async fn get_counts(
    Extension(db): Extension<DatabaseConnection>,
    Extension(hub): Extension<NotificationHub>,
    Extension(cache): Extension<CacheService>,
    AppPath((target_type, target_id)): AppPath<(String, i32)>,
) -> AppResult<impl IntoResponse> {
    let target_type: TargetType = target_type.parse()?;
    let counts = service(db, hub, cache)
        .counts(target_id, target_type)
        .await?;
    Ok(ApiResponse::ok(counts))
}

#[utoipa::path(
    get,
    path = "/api/v1/likes-dislikes/user/{target_type}/{target_id}",
    security(("jwt_token" = [])),
    params(
        ("target_type" = String, Path, description = "Target type"),
        ("target_id" = i32, Path, description = "Target ID"),
    ),
    responses(
        (status = 200, description = "The caller's reaction", body = UserReaction),
        (status = 400, description = "Unknown target type or non-numeric id", body = AppError),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "reactions"
)]
pub async fn get_user_reaction(
    Extension(db): Extension<DatabaseConnection>,
    Extension(hub): Extension<NotificationHub>,
    Extension(cache): Extension<CacheService>,
    auth_user: AuthUser,
    AppPath((target_type, target_id)): AppPath<(String, i32)>,
) -> AppResult<impl IntoResponse> {
    let target_type: TargetType = target_type.parse()?;
    let reaction: UserReaction = service(db, hub, cache)
        .user_reaction(auth_user.member_id, target_id, target_type)
        .await?;
    Ok(ApiResponse::ok(reaction))
}
