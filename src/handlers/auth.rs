use crate::error::{AppError, AppResult};
use crate::extract::AppJson;
use crate::middleware::AuthUser;
use crate::models::MemberModel;
use crate::response::ApiResponse;
use crate::services::auth::{AuthService, TokenPair};
use axum::{response::IntoResponse, Extension};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    /// Username (3-50 characters)
    #[validate(length(min = 3, max = 50))]
    pub username: String,
    /// Email address
    #[validate(email)]
    pub email: String,
    /// Password (min 8 characters)
    #[validate(length(min = 8))]
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    /// Username or email
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    /// JWT access token
    pub token: String,
    /// JWT refresh token
    pub refresh_token: String,
    pub member_id: i32,
    pub username: String,
}

impl AuthResponse {
    fn new(member: MemberModel, tokens: TokenPair) -> Self {
        Self {
            token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            member_id: member.id,
            username: member.username,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    pub token: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MemberResponse {
    pub id: i32,
    pub username: String,
    pub email: String,
    /// `member` or `admin`
    pub role: String,
    pub created_at: String,
}

impl From<MemberModel> for MemberResponse {
    fn from(member: MemberModel) -> Self {
        Self {
            id: member.id,
            username: member.username,
            email: member.email,
            role: member.role,
            created_at: member.created_at.to_string(),
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Member registered", body = AuthResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 409, description = "Username or email already exists", body = AppError),
    ),
    tag = "auth"
)]
pub async fn register(
    Extension(db): Extension<DatabaseConnection>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> AppResult<impl IntoResponse> {
    payload.validate()?;

    let service = AuthService::new(db);
    let (member, tokens) = service
        .register(payload.username.trim(), &payload.email, &payload.password)
        .await?;

    Ok(
        ApiResponse::with_message(AuthResponse::new(member, tokens), "Registration successful")
            .created(),
    )
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials", body = AppError),
    ),
    tag = "auth"
)]
pub async fn login(
    Extension(db): Extension<DatabaseConnection>,
    AppJson(payload): AppJson<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    let service = AuthService::new(db);
    let (member, tokens) = service.login(&payload.username, &payload.password).await?;
    Ok(ApiResponse::ok(AuthResponse::new(member, tokens)))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/refresh",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "Token pair rotated", body = TokenResponse),
        (status = 401, description = "Invalid, expired or reused refresh token", body = AppError),
    ),
    tag = "auth"
)]
pub async fn refresh_token(
    Extension(db): Extension<DatabaseConnection>,
    AppJson(payload): AppJson<RefreshTokenRequest>,
) -> AppResult<impl IntoResponse> {
    let service = AuthService::new(db);
    let tokens = service.rotate_refresh_token(&payload.refresh_token).await?;
    Ok(ApiResponse::ok(TokenResponse {
        token: tokens.access_token,
        refresh_token: tokens.refresh_token,
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    security(("jwt_token" = [])),
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "Refresh token revoked", body = serde_json::Value),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "auth"
)]
pub async fn logout(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    AppJson(payload): AppJson<RefreshTokenRequest>,
) -> AppResult<impl IntoResponse> {
    let service = AuthService::new(db);
    service
        .revoke_refresh_token(auth_user.member_id, &payload.refresh_token)
        .await?;
    Ok(ApiResponse::ok(serde_json::json!({ "logged_out": true })))
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "Current member", body = MemberResponse),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "auth"
)]
pub async fn get_current_member(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let service = AuthService::new(db);
    let member = service.get_member(auth_user.member_id).await?;
    Ok(ApiResponse::ok(MemberResponse::from(member)))
}
