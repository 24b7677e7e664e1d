use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::{de::DeserializeOwned, Serialize};

/// Best-effort JSON cache over Redis. A disabled cache misses every read and
/// drops every write; Redis errors are logged and treated the same way.
#[derive(Clone, Default)]
pub struct CacheService {
    redis: Option<ConnectionManager>,
}

impl CacheService {
    pub fn new(redis: ConnectionManager) -> Self {
        Self { redis: Some(redis) }
    }

    pub fn disabled() -> Self {
        Self { redis: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.redis.is_some()
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let mut conn = self.redis.clone()?;
        let raw: Option<String> = match conn.get(key).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::debug!(key, "cache read failed: {}", e);
                return None;
            }
        };
        raw.and_then(|s| serde_json::from_str(&s).ok())
    }

    pub async fn set<T: Serialize>(&self, key: &str, value: &T, ttl_secs: u64) {
        let Some(mut conn) = self.redis.clone() else {
            return;
        };
        if let Ok(json) = serde_json::to_string(value) {
            if let Err(e) = conn.set_ex::<_, _, ()>(key, json, ttl_secs).await {
                tracing::debug!(key, "cache write failed: {}", e);
            }
        }
    }

    /// Current generation of a versioned entry. Readers fold it into the
    /// data key, so whatever a slow reader stores under an older generation
    /// is never read again. `None` when the cache is off or unreachable;
    /// callers then skip caching altogether.
    pub async fn generation(&self, key: &str) -> Option<u64> {
        let mut conn = self.redis.clone()?;
        match conn.get::<_, Option<u64>>(key).await {
            Ok(generation) => Some(generation.unwrap_or(0)),
            Err(e) => {
                tracing::debug!(key, "cache generation read failed: {}", e);
                None
            }
        }
    }

    /// Retire every entry stored under the current generation of `key`.
    pub async fn bump_generation(&self, key: &str) {
        let Some(mut conn) = self.redis.clone() else {
            return;
        };
        if let Err(e) = conn.incr::<_, _, u64>(key, 1u64).await {
            tracing::warn!(key, "cache generation bump failed: {}", e);
        }
    }
}
