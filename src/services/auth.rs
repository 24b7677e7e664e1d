use crate::{
    error::{AppError, AppResult},
    models::{member, refresh_token, Member, MemberModel, RefreshToken},
    services::is_unique_violation,
    utils::{
        encode_access_token, encode_refresh_token, hash_password,
        jwt::{decode_jwt, hash_refresh_token, refresh_token_expiry_seconds, TokenType},
        verify_password,
    },
};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, QueryFilter, TransactionTrait,
};

/// Upper bound on the stored refresh expiry, ten years.
const MAX_REFRESH_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// An issued access/refresh pair.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

pub struct AuthService {
    db: DatabaseConnection,
}

impl AuthService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> AppResult<(MemberModel, TokenPair)> {
        let password_hash = hash_password(password)?;
        let now = chrono::Utc::now().naive_utc();

        let new_member = member::ActiveModel {
            username: Set(username.to_string()),
            email: Set(email.to_lowercase()),
            password_hash: Set(password_hash),
            role: Set(member::ROLE_MEMBER.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let member = new_member.insert(&self.db).await.map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict("Username or email already exists".to_string())
            } else {
                AppError::Database(e)
            }
        })?;

        tracing::info!(member_id = member.id, "member registered");
        let tokens = self.issue_tokens(&self.db, member.id).await?;
        Ok((member, tokens))
    }

    /// Login by username or email. Unknown member and wrong password are
    /// indistinguishable to the caller.
    pub async fn login(&self, login: &str, password: &str) -> AppResult<(MemberModel, TokenPair)> {
        let member = Member::find()
            .filter(
                sea_orm::Condition::any()
                    .add(member::Column::Username.eq(login))
                    .add(member::Column::Email.eq(login.to_lowercase())),
            )
            .one(&self.db)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !verify_password(password, &member.password_hash)? {
            tracing::debug!(member_id = member.id, "login rejected");
            return Err(AppError::Unauthorized);
        }

        let tokens = self.issue_tokens(&self.db, member.id).await?;
        Ok((member, tokens))
    }

    /// Exchange a refresh token for a new pair. The presented token is
    /// consumed, so replaying it fails.
    pub async fn rotate_refresh_token(&self, presented: &str) -> AppResult<TokenPair> {
        let claims = decode_jwt(presented).map_err(|_| AppError::Unauthorized)?;
        if claims.token_type != TokenType::Refresh {
            return Err(AppError::Unauthorized);
        }
        let member_id = claims.member_id().ok_or(AppError::Unauthorized)?;

        let txn = self.db.begin().await?;
        let existing = RefreshToken::find()
            .filter(refresh_token::Column::MemberId.eq(member_id))
            .filter(refresh_token::Column::Token.eq(hash_refresh_token(presented)))
            .one(&txn)
            .await?
            .ok_or(AppError::Unauthorized)?;

        let deleted = RefreshToken::delete_by_id(existing.id).exec(&txn).await?;
        // A concurrent rotation already consumed it.
        if deleted.rows_affected == 0 {
            return Err(AppError::Unauthorized);
        }
        if existing.expires_at <= chrono::Utc::now().naive_utc() {
            txn.commit().await?;
            return Err(AppError::Unauthorized);
        }

        let tokens = self.issue_tokens(&txn, member_id).await?;
        txn.commit().await?;
        Ok(tokens)
    }

    /// Revoke one refresh token of `member_id`. Unknown tokens are ignored.
    pub async fn revoke_refresh_token(&self, member_id: i32, token: &str) -> AppResult<()> {
        let result = RefreshToken::delete_many()
            .filter(refresh_token::Column::MemberId.eq(member_id))
            .filter(refresh_token::Column::Token.eq(hash_refresh_token(token)))
            .exec(&self.db)
            .await?;
        tracing::debug!(member_id, revoked = result.rows_affected, "logout");
        Ok(())
    }

    pub async fn get_member(&self, id: i32) -> AppResult<MemberModel> {
        Member::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    async fn issue_tokens<C: ConnectionTrait>(&self, conn: &C, member_id: i32) -> AppResult<TokenPair> {
        let subject = member_id.to_string();
        let access_token = encode_access_token(&subject)?;
        let refresh_token = encode_refresh_token(&subject)?;

        let now = chrono::Utc::now().naive_utc();
        let ttl = refresh_token_expiry_seconds()?.min(MAX_REFRESH_TTL_SECS);
        let expires_at = now + chrono::Duration::seconds(ttl as i64);

        refresh_token::ActiveModel {
            member_id: Set(member_id),
            token: Set(hash_refresh_token(&refresh_token)),
            expires_at: Set(expires_at),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(conn)
        .await?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }
}
