//! Settings database access
//!
//! Key-value rows in the `settings` table. Getters for known keys write their
//! default back when the key is missing.

use crate::error::{Error, Result};
use castq_common::db::{Setting, GLOBAL_ENQUEUE_LOCATION_KEY};
use castq_common::{EffectiveEnqueueLocation, EnqueueLocation};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;
use tracing::warn;

/// Settings key holding the item currently playing
pub const CURRENT_ITEM_KEY: &str = "currently_playing_item";

/// Global enqueue location
///
/// A missing value is initialized to `BACK`. A stored `GLOBAL` or unknown name
/// reads as `BACK`, since the global default must be a concrete strategy.
pub async fn get_global_enqueue_location(db: &Pool<Sqlite>) -> Result<EffectiveEnqueueLocation> {
    match get_setting::<String>(db, GLOBAL_ENQUEUE_LOCATION_KEY).await? {
        Some(name) => {
            let location = EnqueueLocation::from_name(Some(&name));
            match EffectiveEnqueueLocation::try_from(location) {
                Ok(effective) => Ok(effective),
                Err(_) => {
                    warn!(
                        "Global enqueue location '{}' is not a concrete strategy, using BACK",
                        name
                    );
                    Ok(EffectiveEnqueueLocation::Back)
                }
            }
        }
        None => {
            let default = EffectiveEnqueueLocation::default();
            set_global_enqueue_location(db, default).await?;
            Ok(default)
        }
    }
}

/// Store the global enqueue location by name
pub async fn set_global_enqueue_location(
    db: &Pool<Sqlite>,
    location: EffectiveEnqueueLocation,
) -> Result<()> {
    set_setting(db, GLOBAL_ENQUEUE_LOCATION_KEY, location.name()).await
}

/// Item currently playing, if any
///
/// The id is not checked against the queue; a stale id simply matches nothing.
pub async fn get_current_item(db: &Pool<Sqlite>) -> Result<Option<i64>> {
    get_setting::<i64>(db, CURRENT_ITEM_KEY).await
}

/// Set or clear the item currently playing
pub async fn set_current_item(db: &Pool<Sqlite>, item_id: Option<i64>) -> Result<()> {
    match item_id {
        Some(id) => set_setting(db, CURRENT_ITEM_KEY, id).await,
        None => {
            sqlx::query("DELETE FROM settings WHERE key = ?")
                .bind(CURRENT_ITEM_KEY)
                .execute(db)
                .await?;
            Ok(())
        }
    }
}

/// Every setting, ordered by key
pub async fn get_all_settings(db: &Pool<Sqlite>) -> Result<Vec<Setting>> {
    let settings = sqlx::query_as::<_, Setting>("SELECT key, value FROM settings ORDER BY key")
        .fetch_all(db)
        .await?;
    Ok(settings)
}

/// Generic setting getter
///
/// Missing keys and NULL values both read as `None`.
pub async fn get_setting<T: FromStr>(db: &Pool<Sqlite>, key: &str) -> Result<Option<T>> {
    let value: Option<Option<String>> =
        sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(db)
            .await?;

    match value.flatten() {
        Some(s) => match s.parse::<T>() {
            Ok(parsed) => Ok(Some(parsed)),
            Err(_) => Err(Error::Config(format!(
                "Failed to parse setting '{}' value: {}",
                key, s
            ))),
        },
        None => Ok(None),
    }
}

/// Generic setting setter (insert or update)
pub async fn set_setting<T: ToString>(db: &Pool<Sqlite>, key: &str, value: T) -> Result<()> {
    let value_str = value.to_string();

    sqlx::query(
        r#"
        INSERT INTO settings (key, value)
        VALUES (?, ?)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(key)
    .bind(value_str)
    .execute(db)
    .await?;

    Ok(())
}
