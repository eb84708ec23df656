//! Declared table schemas
//!
//! Source of truth for columns added after a table's first release. Each new
//! column must also appear in the matching `CREATE TABLE` in `init.rs`.

use crate::db::schema_sync::{sync_table, ColumnDefinition, TableSchema};
use crate::Result;
use sqlx::SqlitePool;
use tracing::info;

/// `feed_preferences`: one row per subscribed feed
pub struct FeedPreferencesTableSchema;

impl TableSchema for FeedPreferencesTableSchema {
    fn table_name() -> &'static str {
        "feed_preferences"
    }

    fn expected_columns() -> Vec<ColumnDefinition> {
        vec![
            ColumnDefinition::new("feed_id", "INTEGER").primary_key(),
            ColumnDefinition::new("auto_download", "INTEGER").not_null().default("2"),
            ColumnDefinition::new("keep_updated", "INTEGER").not_null().default("1"),
            ColumnDefinition::new("auto_delete_action", "INTEGER").not_null().default("0"),
            ColumnDefinition::new("volume_adaption", "INTEGER").not_null().default("0"),
            ColumnDefinition::new("username", "TEXT"),
            ColumnDefinition::new("password", "TEXT"),
            ColumnDefinition::new("include_filter", "TEXT").not_null().default("''"),
            ColumnDefinition::new("exclude_filter", "TEXT").not_null().default("''"),
            ColumnDefinition::new("minimal_duration_filter", "INTEGER").not_null().default("0"),
            ColumnDefinition::new("playback_speed", "REAL").not_null().default("-1.0"),
            ColumnDefinition::new("skip_intro", "INTEGER").not_null().default("0"),
            ColumnDefinition::new("skip_ending", "INTEGER").not_null().default("0"),
            ColumnDefinition::new("skip_silence", "INTEGER").not_null().default("0"),
            ColumnDefinition::new("episode_notification", "INTEGER").not_null().default("0"),
            ColumnDefinition::new("new_episodes_action", "INTEGER").not_null().default("0"),
            ColumnDefinition::new("tags", "TEXT").not_null().default("'[]'"),
            // 0 = GLOBAL; legacy rows pick this up when the column is added
            ColumnDefinition::new("enqueue_location", "INTEGER").default("0"),
        ]
    }
}

/// `queue`: ordered playback queue
pub struct QueueTableSchema;

impl TableSchema for QueueTableSchema {
    fn table_name() -> &'static str {
        "queue"
    }

    fn expected_columns() -> Vec<ColumnDefinition> {
        vec![
            ColumnDefinition::new("guid", "TEXT").primary_key(),
            ColumnDefinition::new("item_id", "INTEGER").not_null(),
            ColumnDefinition::new("feed_id", "INTEGER").not_null().default("0"),
            ColumnDefinition::new("play_order", "INTEGER").not_null(),
            ColumnDefinition::new("enqueued_at", "TIMESTAMP"),
        ]
    }
}

/// Synchronize every declared table
pub async fn sync_all_table_schemas(pool: &SqlitePool) -> Result<()> {
    sync_table::<FeedPreferencesTableSchema>(pool).await?;
    sync_table::<QueueTableSchema>(pool).await?;
    info!("Schema synchronization complete");
    Ok(())
}
