use std::sync::Arc;

use sqlx::pool::PoolConnection;
use sqlx::{Sqlite, SqlitePool};

use crate::config::AppConfig;
use crate::db;
use crate::storage::{DiskStore, ImageStore};

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
    pub images: Arc<dyn ImageStore>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let db = db::connect(&config.database_url, config.db_retry.busy_timeout()).await?;
        let images =
            Arc::new(DiskStore::new(&config.uploads.static_dir)) as Arc<dyn ImageStore>;
        Ok(Self { db, config, images })
    }

    pub fn from_parts(
        db: SqlitePool,
        config: Arc<AppConfig>,
        images: Arc<dyn ImageStore>,
    ) -> Self {
        Self { db, config, images }
    }

    /// Scoped connection checkout with the configured lock-retry policy; the
    /// connection returns to the pool when the guard drops.
    pub async fn acquire(&self) -> anyhow::Result<PoolConnection<Sqlite>> {
        db::acquire(&self.db, &self.config.db_retry).await
    }

    pub fn fake() -> Self {
        use async_trait::async_trait;
        use bytes::Bytes;

        struct FakeImages;

        #[async_trait]
        impl ImageStore for FakeImages {
            async fn save(&self, filename: &str, _body: Bytes) -> anyhow::Result<String> {
                Ok(format!("{}/{}", crate::storage::UPLOAD_SUBDIR, filename))
            }
        }

        let db = sqlx::sqlite::SqlitePoolOptions::new()
            .connect_lazy("sqlite::memory:")
            .expect("lazy pool ok");

        let config = Arc::new(AppConfig {
            database_url: "sqlite::memory:".into(),
            session: crate::config::SessionConfig {
                secret: "test-secret".into(),
                ttl_minutes: 5,
            },
            uploads: crate::config::UploadConfig {
                static_dir: "static".into(),
            },
            db_retry: crate::config::RetryPolicy {
                max_attempts: 3,
                delay_ms: 10,
                busy_timeout_secs: 1,
            },
        });

        Self {
            db,
            config,
            images: Arc::new(FakeImages),
        }
    }
}
