use crate::config::jwt::JwtConfig;
use crate::error::AppResult;
use anyhow::Result;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::OnceLock;

static JWT_CONFIG: OnceLock<JwtConfig> = OnceLock::new();

/// Install the JWT config. Must be called once at startup.
pub fn init_jwt_config(config: JwtConfig) -> Result<()> {
    JWT_CONFIG
        .set(config)
        .map_err(|_| anyhow::anyhow!("JWT config already initialized"))?;
    Ok(())
}

fn get_config() -> Result<&'static JwtConfig> {
    JWT_CONFIG
        .get()
        .ok_or_else(|| anyhow::anyhow!("JWT config not initialized"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Member id.
    pub sub: String,
    pub exp: usize,
    pub iat: usize,
    /// Unique per token so two refresh tokens issued in the same second
    /// never hash to the same stored value.
    pub jti: String,
    pub token_type: TokenType,
}

impl Claims {
    pub fn member_id(&self) -> Option<i32> {
        self.sub.parse().ok()
    }
}

fn encode_token(member_id: &str, token_type: TokenType, ttl_secs: u64) -> Result<String> {
    let config = get_config()?;
    let now = chrono::Utc::now().timestamp() as usize;
    let claims = Claims {
        sub: member_id.to_owned(),
        exp: now + ttl_secs as usize,
        iat: now,
        jti: uuid::Uuid::new_v4().to_string(),
        token_type,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(|e| anyhow::anyhow!("Failed to encode {:?} token: {}", token_type, e))
}

pub fn encode_access_token(member_id: &str) -> Result<String> {
    encode_token(member_id, TokenType::Access, access_token_expiry_seconds()?)
}

pub fn encode_refresh_token(member_id: &str) -> Result<String> {
    encode_token(member_id, TokenType::Refresh, refresh_token_expiry_seconds()?)
}

pub fn decode_jwt(token: &str) -> AppResult<Claims> {
    let config = get_config()?;
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}

pub fn access_token_expiry_seconds() -> Result<u64> {
    Ok(get_config()?.access_token_expiry)
}

pub fn refresh_token_expiry_seconds() -> Result<u64> {
    Ok(get_config()?.refresh_token_expiry)
}

/// Refresh tokens are stored as a SHA-256 hex digest, never in clear.
pub fn hash_refresh_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Once;

    static INIT: Once = Once::new();

    fn ensure_config() {
        INIT.call_once(|| {
            let _ = init_jwt_config(JwtConfig {
                secret: "unit_test_secret_that_is_long_enough_for_hs256".to_string(),
                access_token_expiry: 900,
                refresh_token_expiry: 3600,
            });
        });
    }

    #[test]
    fn access_token_carries_member_and_type() {
        ensure_config();
        let token = encode_access_token("42").unwrap();
        let claims = decode_jwt(&token).unwrap();
        assert_eq!(claims.member_id(), Some(42));
        assert_eq!(claims.token_type, TokenType::Access);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn refresh_tokens_are_unique() {
        ensure_config();
        let a = encode_refresh_token("7").unwrap();
        let b = encode_refresh_token("7").unwrap();
        assert_ne!(a, b);
        assert_ne!(hash_refresh_token(&a), hash_refresh_token(&b));
        assert_eq!(decode_jwt(&a).unwrap().token_type, TokenType::Refresh);
    }

    #[test]
    fn expired_token_fails() {
        ensure_config();
        let config = get_config().unwrap();
        let now = chrono::Utc::now().timestamp() as usize;
        let claims = Claims {
            sub: "42".to_string(),
            exp: now - 3600,
            iat: now - 7200,
            jti: "expired".to_string(),
            token_type: TokenType::Access,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.secret.as_bytes()),
        )
        .unwrap();
        assert!(decode_jwt(&token).is_err());
    }

    #[test]
    fn garbage_token_fails() {
        ensure_config();
        assert!(decode_jwt("").is_err());
        assert!(decode_jwt("not.a.jwt").is_err());
    }

    #[test]
    fn refresh_hash_is_stable_hex() {
        let h = hash_refresh_token("abc");
        assert_eq!(h.len(), 64);
        assert_eq!(h, hash_refresh_token("abc"));
    }
}
