use std::env;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "dev" | "development" | "local" => AppEnv::Development,
            _ => AppEnv::Production,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: AppEnv,
    pub host: String,
    pub port: u16,
    pub json_logs: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let env = env::var("APP_ENV")
            .map(|raw| AppEnv::parse(&raw))
            .unwrap_or(AppEnv::Production);
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);
        let json_logs = env::var("LOG_FORMAT")
            .map(|v| v.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        Self {
            env,
            host,
            port,
            json_logs,
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Whether error bodies may carry internal detail.
pub fn is_development() -> bool {
    static ENV: OnceLock<AppEnv> = OnceLock::new();
    *ENV.get_or_init(|| AppConfig::from_env().env) == AppEnv::Development
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_env_is_production() {
        assert_eq!(AppEnv::parse("staging"), AppEnv::Production);
    }

    #[test]
    fn dev_aliases() {
        assert_eq!(AppEnv::parse("dev"), AppEnv::Development);
        assert_eq!(AppEnv::parse("Development"), AppEnv::Development);
    }
}
