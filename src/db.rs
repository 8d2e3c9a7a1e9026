use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool};
use tracing::warn;

use crate::config::RetryPolicy;

pub async fn connect(database_url: &str, busy_timeout: Duration) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)
        .with_context(|| format!("parse database url {}", database_url))?
        .create_if_missing(true)
        .busy_timeout(busy_timeout);

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await
        .context("connect to database")?;
    Ok(pool)
}

/// True when the error reports SQLITE_BUSY, i.e. another connection holds the
/// write lock on the database file.
pub fn is_locked(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => {
            db.code().as_deref() == Some("5") || db.message().contains("database is locked")
        }
        _ => false,
    }
}

/// Acquire a pooled connection, retrying lock contention up to the policy's
/// attempt limit. Any other error propagates immediately. The returned
/// connection goes back to the pool when dropped, on every exit path.
pub async fn acquire(
    pool: &SqlitePool,
    policy: &RetryPolicy,
) -> anyhow::Result<PoolConnection<Sqlite>> {
    let mut attempts = 0u32;
    loop {
        match pool.acquire().await {
            Ok(conn) => return Ok(conn),
            Err(e) if is_locked(&e) => {
                attempts += 1;
                if attempts >= policy.max_attempts {
                    anyhow::bail!("database still locked after {} attempts", attempts);
                }
                warn!(attempts, "database locked, retrying");
                tokio::time::sleep(policy.delay()).await;
            }
            Err(e) => return Err(e).context("acquire database connection"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            delay_ms: 10,
            busy_timeout_secs: 1,
        }
    }

    #[test]
    fn is_locked_ignores_non_database_errors() {
        assert!(!is_locked(&sqlx::Error::RowNotFound));
        assert!(!is_locked(&sqlx::Error::PoolTimedOut));
    }

    #[tokio::test]
    async fn acquire_yields_a_usable_connection() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("memory pool");

        let mut conn = acquire(&pool, &test_policy()).await.expect("acquire");
        let one: (i64,) = sqlx::query_as("SELECT 1")
            .fetch_one(&mut *conn)
            .await
            .expect("select");
        assert_eq!(one.0, 1);
    }

    #[tokio::test]
    async fn connect_applies_options() {
        let pool = connect("sqlite::memory:", Duration::from_secs(1))
            .await
            .expect("connect");
        let one: (i64,) = sqlx::query_as("SELECT 1")
            .fetch_one(&pool)
            .await
            .expect("select");
        assert_eq!(one.0, 1);
    }
}
