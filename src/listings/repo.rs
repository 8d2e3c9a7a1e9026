use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqliteConnection};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Item {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub image_path: String,
    pub user_id: i64,
    pub nickname: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Bid {
    pub id: i64,
    pub item_id: i64,
    pub title: String,
    pub description: String,
    pub image_path: String,
    pub user_id: i64,
    pub nickname: String,
    pub created_at: String,
}

/// Column values for a new item or bid row. Rows are write-once; nothing
/// updates or deletes them afterwards.
#[derive(Debug)]
pub struct NewListing<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub image_path: &'a str,
    pub user_id: i64,
    pub nickname: &'a str,
    pub created_at: &'a str,
}

/// All items, newest first. The id tie-break keeps the order stable when two
/// rows share a one-second timestamp.
pub async fn list_items(conn: &mut SqliteConnection) -> anyhow::Result<Vec<Item>> {
    let items = sqlx::query_as::<_, Item>(
        r#"
        SELECT id, title, description, image_path, user_id, nickname, created_at
        FROM items
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .fetch_all(&mut *conn)
    .await?;
    Ok(items)
}

pub async fn get_item(conn: &mut SqliteConnection, id: i64) -> anyhow::Result<Option<Item>> {
    let item = sqlx::query_as::<_, Item>(
        r#"
        SELECT id, title, description, image_path, user_id, nickname, created_at
        FROM items
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(item)
}

pub async fn insert_item(
    conn: &mut SqliteConnection,
    new: &NewListing<'_>,
) -> anyhow::Result<Item> {
    let item = sqlx::query_as::<_, Item>(
        r#"
        INSERT INTO items (title, description, image_path, user_id, nickname, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        RETURNING id, title, description, image_path, user_id, nickname, created_at
        "#,
    )
    .bind(new.title)
    .bind(new.description)
    .bind(new.image_path)
    .bind(new.user_id)
    .bind(new.nickname)
    .bind(new.created_at)
    .fetch_one(&mut *conn)
    .await?;
    Ok(item)
}

/// Bids against one item, in submission order.
pub async fn list_bids(conn: &mut SqliteConnection, item_id: i64) -> anyhow::Result<Vec<Bid>> {
    let bids = sqlx::query_as::<_, Bid>(
        r#"
        SELECT id, item_id, title, description, image_path, user_id, nickname, created_at
        FROM bids
        WHERE item_id = ?
        ORDER BY created_at ASC, id ASC
        "#,
    )
    .bind(item_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(bids)
}

pub async fn insert_bid(
    conn: &mut SqliteConnection,
    item_id: i64,
    new: &NewListing<'_>,
) -> anyhow::Result<Bid> {
    let bid = sqlx::query_as::<_, Bid>(
        r#"
        INSERT INTO bids (item_id, title, description, image_path, user_id, nickname, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        RETURNING id, item_id, title, description, image_path, user_id, nickname, created_at
        "#,
    )
    .bind(item_id)
    .bind(new.title)
    .bind(new.description)
    .bind(new.image_path)
    .bind(new.user_id)
    .bind(new.nickname)
    .bind(new.created_at)
    .fetch_one(&mut *conn)
    .await?;
    Ok(bid)
}
