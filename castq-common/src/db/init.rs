//! Database initialization
//!
//! Creates the database on first run and brings older files up to date:
//! 1. `CREATE TABLE IF NOT EXISTS` for every table
//! 2. Schema synchronization (adds columns missing from older files)
//! 3. Versioned migrations
//! 4. Default settings

use crate::enqueue_location::EffectiveEnqueueLocation;
use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::{info, warn};

/// Settings key holding the global enqueue location (stored by name)
pub const GLOBAL_ENQUEUE_LOCATION_KEY: &str = "enqueue_location";

/// Open (creating if needed) the database at `db_path` and prepare its schema
pub async fn init_database(
    db_path: &Path,
    global_default: EffectiveEnqueueLocation,
) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;
    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    prepare_schema(&pool, global_default).await?;

    Ok(pool)
}

/// Create tables, sync columns, migrate and seed defaults on an open pool
pub async fn prepare_schema(
    pool: &SqlitePool,
    global_default: EffectiveEnqueueLocation,
) -> Result<()> {
    sqlx::query("PRAGMA foreign_keys = ON").execute(pool).await?;

    create_schema_version_table(pool).await?;
    create_settings_table(pool).await?;
    create_feed_preferences_table(pool).await?;
    create_queue_table(pool).await?;

    crate::db::table_schemas::sync_all_table_schemas(pool).await?;
    crate::db::migrations::run_migrations(pool).await?;

    ensure_setting(pool, GLOBAL_ENQUEUE_LOCATION_KEY, global_default.name()).await?;

    Ok(())
}

async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Key-value application settings
pub async fn create_settings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Per-feed preferences; coded enums stored as integers
pub async fn create_feed_preferences_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS feed_preferences (
            feed_id INTEGER PRIMARY KEY,
            auto_download INTEGER NOT NULL DEFAULT 2,
            keep_updated INTEGER NOT NULL DEFAULT 1,
            auto_delete_action INTEGER NOT NULL DEFAULT 0,
            volume_adaption INTEGER NOT NULL DEFAULT 0,
            username TEXT,
            password TEXT,
            include_filter TEXT NOT NULL DEFAULT '',
            exclude_filter TEXT NOT NULL DEFAULT '',
            minimal_duration_filter INTEGER NOT NULL DEFAULT 0,
            playback_speed REAL NOT NULL DEFAULT -1.0,
            skip_intro INTEGER NOT NULL DEFAULT 0,
            skip_ending INTEGER NOT NULL DEFAULT 0,
            skip_silence INTEGER NOT NULL DEFAULT 0,
            episode_notification INTEGER NOT NULL DEFAULT 0,
            new_episodes_action INTEGER NOT NULL DEFAULT 0,
            tags TEXT NOT NULL DEFAULT '[]',
            enqueue_location INTEGER DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Playback queue ordered by `play_order`
pub async fn create_queue_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS queue (
            guid TEXT PRIMARY KEY,
            item_id INTEGER NOT NULL,
            feed_id INTEGER NOT NULL DEFAULT 0,
            play_order INTEGER NOT NULL,
            enqueued_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE UNIQUE INDEX IF NOT EXISTS idx_queue_item ON queue(item_id)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_queue_order ON queue(play_order)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Ensure a setting exists, resetting NULL values to the default
async fn ensure_setting(pool: &SqlitePool, key: &str, default_value: &str) -> Result<()> {
    let value: Option<Option<String>> =
        sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(pool)
            .await?;

    match value {
        None => {
            sqlx::query("INSERT OR IGNORE INTO settings (key, value) VALUES (?, ?)")
                .bind(key)
                .bind(default_value)
                .execute(pool)
                .await?;
            info!("Initialized setting '{}' with default value: {}", key, default_value);
        }
        Some(None) => {
            sqlx::query("UPDATE settings SET value = ? WHERE key = ?")
                .bind(default_value)
                .bind(key)
                .execute(pool)
                .await?;
            warn!("Setting '{}' was NULL, reset to default: {}", key, default_value);
        }
        Some(Some(_)) => {}
    }

    Ok(())
}
