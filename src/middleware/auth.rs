use crate::{
    error::{AppError, AppResult},
    models::{Member, MemberModel},
    utils::jwt::{decode_jwt, TokenType},
};
use axum::{
    extract::{FromRequestParts, Request},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
    Extension,
};
use sea_orm::{DatabaseConnection, EntityTrait};

/// The authenticated caller, inserted into request extensions by
/// [`auth_middleware`].
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub member_id: i32,
    pub is_admin: bool,
}

/// Resolves `Authorization: Bearer <access token>` to an [`AuthUser`].
/// Refresh tokens and tokens of deleted members are rejected with 401.
pub async fn auth_middleware(
    Extension(db): Extension<DatabaseConnection>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_bearer_token(&headers).ok_or(AppError::Unauthorized)?;
    let member = resolve_member(&db, token).await?;

    request.extensions_mut().insert(AuthUser {
        member_id: member.id,
        is_admin: member.is_admin(),
    });

    Ok(next.run(request).await)
}

async fn resolve_member(db: &DatabaseConnection, token: &str) -> AppResult<MemberModel> {
    let claims = decode_jwt(token).map_err(|_| AppError::Unauthorized)?;
    if claims.token_type != TokenType::Access {
        return Err(AppError::Unauthorized);
    }
    let member_id = claims.member_id().ok_or(AppError::Unauthorized)?;

    Member::find_by_id(member_id)
        .one(db)
        .await?
        .ok_or(AppError::Unauthorized)
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

impl AuthUser {
    /// Owners may always act on their own content; admins on anyone's.
    pub fn can_manage(&self, owner_id: i32) -> bool {
        self.is_admin || self.member_id == owner_id
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}
