use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub secret: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    /// Root of the statically served tree; uploads land in `<static_dir>/uploads`.
    pub static_dir: String,
}

/// Bounded retry applied when the database file is locked.
#[derive(Debug, Clone, Deserialize)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay_ms: u64,
    pub busy_timeout_secs: u64,
}

impl RetryPolicy {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_secs(self.busy_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub session: SessionConfig,
    pub uploads: UploadConfig,
    pub db_retry: RetryPolicy,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:tradepost.db".into());
        let session = SessionConfig {
            secret: std::env::var("SESSION_SECRET")?,
            ttl_minutes: std::env::var("SESSION_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24),
        };
        let uploads = UploadConfig {
            static_dir: std::env::var("STATIC_DIR").unwrap_or_else(|_| "static".into()),
        };
        let db_retry = RetryPolicy {
            max_attempts: std::env::var("DB_RETRY_MAX_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(5),
            delay_ms: std::env::var("DB_RETRY_DELAY_MS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(100),
            busy_timeout_secs: std::env::var("DB_BUSY_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(5),
        };
        Ok(Self {
            database_url,
            session,
            uploads,
            db_retry,
        })
    }
}
