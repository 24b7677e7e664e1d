use std::env;
use std::str::FromStr;

/// Token bucket parameters for one route group: replenish one request every
/// `per_second` seconds, allow bursts of `burst_size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitRule {
    pub per_second: u64,
    pub burst_size: u32,
}

impl RateLimitRule {
    const fn new(per_second: u64, burst_size: u32) -> Self {
        Self {
            per_second,
            burst_size,
        }
    }
}

impl FromStr for RateLimitRule {
    type Err = String;

    /// Parses `per:burst`, e.g. `10:20`.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (per_second_raw, burst_raw) = raw
            .trim()
            .split_once(':')
            .ok_or_else(|| format!("invalid rule '{raw}', expected per:burst"))?;

        let per_second: u64 = per_second_raw
            .trim()
            .parse()
            .map_err(|_| format!("invalid per_second '{}'", per_second_raw.trim()))?;
        let burst_size: u32 = burst_raw
            .trim()
            .parse()
            .map_err(|_| format!("invalid burst_size '{}'", burst_raw.trim()))?;

        if per_second == 0 || burst_size == 0 {
            return Err("per_second and burst_size must be > 0".to_string());
        }

        Ok(Self::new(per_second, burst_size))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteGroup {
    Auth,
    Public,
    Protected,
}

impl RouteGroup {
    fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "auth" => Some(Self::Auth),
            "public" | "public_read" | "public-read" => Some(Self::Public),
            "protected" => Some(Self::Protected),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub auth: RateLimitRule,
    pub public: RateLimitRule,
    pub protected: RateLimitRule,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            auth: RateLimitRule::new(5, 10),
            public: RateLimitRule::new(30, 60),
            protected: RateLimitRule::new(10, 20),
        }
    }
}

impl RateLimitConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        cfg.enabled = super::parse_bool_env("RATE_LIMIT_ENABLED", cfg.enabled);

        if let Ok(raw) = env::var("RATE_LIMIT_CONFIG") {
            if let Err(err) = cfg.apply(&raw) {
                tracing::warn!("Invalid RATE_LIMIT_CONFIG '{}': {}", raw, err);
            }
        }

        cfg
    }

    pub fn rule(&self, group: RouteGroup) -> RateLimitRule {
        match group {
            RouteGroup::Auth => self.auth,
            RouteGroup::Public => self.public,
            RouteGroup::Protected => self.protected,
        }
    }

    /// Apply either a global `per:burst` or a grouped
    /// `auth=5:10,public=30:60,protected=10:20` override. Nothing is applied
    /// when any item is invalid.
    fn apply(&mut self, raw: &str) -> Result<(), String> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err("empty value".to_string());
        }

        if !trimmed.contains('=') {
            let rule: RateLimitRule = trimmed.parse()?;
            self.auth = rule;
            self.public = rule;
            self.protected = rule;
            return Ok(());
        }

        let mut next = *self;
        for item in trimmed.split(',').map(str::trim).filter(|i| !i.is_empty()) {
            let (name, raw_rule) = item
                .split_once('=')
                .ok_or_else(|| format!("invalid item '{item}', expected name=per:burst"))?;
            let rule: RateLimitRule = raw_rule.parse()?;
            match RouteGroup::parse(name) {
                Some(RouteGroup::Auth) => next.auth = rule,
                Some(RouteGroup::Public) => next.public = rule,
                Some(RouteGroup::Protected) => next.protected = rule,
                None => {
                    return Err(format!(
                        "unknown group '{}', expected auth/public/protected",
                        name.trim()
                    ))
                }
            }
        }
        *self = next;
        Ok(())
    }
}
