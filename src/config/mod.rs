use std::env;
use std::time::Duration;

use thiserror::Error;

/// 默认会话有效期（秒）
pub const DEFAULT_SESSION_TTL_SECS: u64 = 7200;
/// 会话有效期上限：30 天
pub const MAX_SESSION_TTL_SECS: u64 = 30 * 24 * 3600;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub server_host: String,
    pub server_port: u16,
    pub api_base_uri: String,
    pub session_ttl_secs: u64,
    pub backend_timeout_ms: u64,
    pub bcrypt_cost: u32,
    pub cors_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        Ok(Config {
            database_url: required("DATABASE_URL")?,
            redis_url: required("REDIS_URL")?,
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            server_port: parsed("SERVER_PORT", 7100)?,
            api_base_uri: env::var("API_BASE_URI").unwrap_or_else(|_| "/api".into()),
            session_ttl_secs: session_ttl_secs(parsed(
                "SESSION_TTL_SECONDS",
                DEFAULT_SESSION_TTL_SECS,
            )?)?,
            backend_timeout_ms: parsed("BACKEND_TIMEOUT_MS", 3000)?,
            bcrypt_cost: parsed("BCRYPT_COST", bcrypt::DEFAULT_COST)?,
            cors_origins: env::var("CORS_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
        })
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    pub fn backend_timeout(&self) -> Duration {
        Duration::from_millis(self.backend_timeout_ms)
    }
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::Missing(key))
}

/// 会话有效期必须在 1..=MAX_SESSION_TTL_SECS 之内
pub fn session_ttl_secs(secs: u64) -> Result<u64, ConfigError> {
    if (1..=MAX_SESSION_TTL_SECS).contains(&secs) {
        Ok(secs)
    } else {
        Err(ConfigError::Invalid {
            key: "SESSION_TTL_SECONDS",
            value: secs.to_string(),
        })
    }
}

fn parsed<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        Err(_) => Ok(default),
    }
}
