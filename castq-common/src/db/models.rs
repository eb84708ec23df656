//! Database row models

use serde::{Deserialize, Serialize};

pub use crate::feed_preferences::FeedPreferencesRow;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Setting {
    pub key: String,
    pub value: Option<String>,
}

/// One `queue` table row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct QueueEntryRow {
    pub guid: String,
    pub item_id: i64,
    pub feed_id: i64,
    pub play_order: i64,
}
