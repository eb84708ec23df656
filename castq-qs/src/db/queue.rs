//! Queue database operations
//!
//! Entries are ordered by `play_order`, kept in steps of 10. Inserting before an
//! existing entry shifts it and everything after it by 10 inside one transaction.

use crate::error::{Error, Result};
use castq_common::db::QueueEntryRow;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{Pool, Sqlite};
use uuid::Uuid;

/// Distance between consecutive `play_order` values
pub const PLAY_ORDER_STEP: i64 = 10;

/// Queue entry as reported to clients
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct QueueEntry {
    pub guid: String,
    pub item_id: i64,
    pub feed_id: i64,
    pub play_order: i64,
    pub enqueued_at: DateTime<Utc>,
}

/// All entries in play order
pub async fn get_queue(db: &Pool<Sqlite>) -> Result<Vec<QueueEntry>> {
    let entries = sqlx::query_as::<_, QueueEntry>(
        r#"
        SELECT guid, item_id, feed_id, play_order, enqueued_at
        FROM queue
        ORDER BY play_order ASC
        "#,
    )
    .fetch_all(db)
    .await?;

    Ok(entries)
}

/// Item ids in play order
pub async fn get_queue_item_ids(db: &Pool<Sqlite>) -> Result<Vec<i64>> {
    let ids = sqlx::query_scalar("SELECT item_id FROM queue ORDER BY play_order ASC")
        .fetch_all(db)
        .await?;
    Ok(ids)
}

/// Queue row holding `item_id`, if any
pub async fn find_by_item(db: &Pool<Sqlite>, item_id: i64) -> Result<Option<QueueEntryRow>> {
    let row = sqlx::query_as::<_, QueueEntryRow>(
        "SELECT guid, item_id, feed_id, play_order FROM queue WHERE item_id = ?",
    )
    .bind(item_id)
    .fetch_optional(db)
    .await?;

    Ok(row)
}

/// Insert `item_id` so that it ends up at `index` in play order
///
/// `index` past the end appends.
pub async fn insert_at(
    db: &Pool<Sqlite>,
    index: usize,
    item_id: i64,
    feed_id: i64,
) -> Result<Uuid> {
    let guid = Uuid::new_v4();
    let mut tx = db.begin().await?;

    let orders: Vec<i64> = sqlx::query_scalar("SELECT play_order FROM queue ORDER BY play_order ASC")
        .fetch_all(&mut *tx)
        .await?;

    let play_order = match orders.get(index) {
        Some(&order) => {
            sqlx::query("UPDATE queue SET play_order = play_order + ? WHERE play_order >= ?")
                .bind(PLAY_ORDER_STEP)
                .bind(order)
                .execute(&mut *tx)
                .await?;
            order
        }
        None => orders.last().copied().unwrap_or(0) + PLAY_ORDER_STEP,
    };

    sqlx::query(
        r#"
        INSERT INTO queue (guid, item_id, feed_id, play_order, enqueued_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(guid.to_string())
    .bind(item_id)
    .bind(feed_id)
    .bind(play_order)
    .bind(Utc::now())
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(guid)
}

/// Remove an item from the queue
pub async fn remove_item(db: &Pool<Sqlite>, item_id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM queue WHERE item_id = ?")
        .bind(item_id)
        .execute(db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Item {} is not queued", item_id)));
    }
    Ok(())
}

/// Remove every entry; returns how many were removed
pub async fn clear_queue(db: &Pool<Sqlite>) -> Result<u64> {
    let result = sqlx::query("DELETE FROM queue").execute(db).await?;
    Ok(result.rows_affected())
}
