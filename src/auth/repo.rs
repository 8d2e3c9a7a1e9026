use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqliteConnection};

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub nickname: String,
}

/// Find a user by username.
pub async fn find_by_username(
    conn: &mut SqliteConnection,
    username: &str,
) -> anyhow::Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, password_hash, nickname
        FROM users
        WHERE username = ?
        "#,
    )
    .bind(username)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(user)
}

/// Create a new user with an already hashed password.
pub async fn create(
    conn: &mut SqliteConnection,
    username: &str,
    password_hash: &str,
    nickname: &str,
) -> anyhow::Result<User> {
    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (username, password_hash, nickname)
        VALUES (?, ?, ?)
        RETURNING id, username, password_hash, nickname
        "#,
    )
    .bind(username)
    .bind(password_hash)
    .bind(nickname)
    .fetch_one(&mut *conn)
    .await?;
    Ok(user)
}

/// True when the error is the store rejecting a duplicate key, e.g. a
/// username that raced past the signup pre-check.
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    match err.downcast_ref::<sqlx::Error>() {
        Some(sqlx::Error::Database(db)) => {
            matches!(db.kind(), sqlx::error::ErrorKind::UniqueViolation)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;
    use sqlx::SqlitePool;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("memory pool");
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("migrations");
        pool
    }

    #[tokio::test]
    async fn create_then_find_round_trips() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.expect("acquire");

        let created = create(&mut conn, "alice", "hash-value", "Al")
            .await
            .expect("create");
        assert_eq!(created.username, "alice");
        assert_eq!(created.nickname, "Al");

        let found = find_by_username(&mut conn, "alice")
            .await
            .expect("find")
            .expect("present");
        assert_eq!(found.id, created.id);
        assert_eq!(found.password_hash, "hash-value");
    }

    #[tokio::test]
    async fn find_unknown_username_is_none() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.expect("acquire");
        let found = find_by_username(&mut conn, "nobody").await.expect("find");
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn duplicate_username_is_a_unique_violation() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.expect("acquire");

        create(&mut conn, "alice", "h1", "Al").await.expect("first");
        let err = create(&mut conn, "alice", "h2", "Al2")
            .await
            .expect_err("duplicate should fail");
        assert!(is_unique_violation(&err));
    }

    #[tokio::test]
    async fn other_errors_are_not_unique_violations() {
        let err = anyhow::anyhow!("plain error");
        assert!(!is_unique_violation(&err));
    }
}
