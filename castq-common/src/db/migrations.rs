//! Versioned schema migrations
//!
//! Column additions are handled by schema synchronization; migrations cover
//! data fixes that cannot be expressed as a column default. Applied versions are
//! recorded in `schema_version`, and every migration is idempotent.
//!
//! Never edit a released migration. Add a new one and bump
//! [`CURRENT_SCHEMA_VERSION`].

use crate::Result;
use sqlx::SqlitePool;
use tracing::{info, warn};

pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// Latest applied version, 0 for a fresh database
pub async fn get_schema_version(pool: &SqlitePool) -> Result<i32> {
    let version: Option<i32> =
        sqlx::query_scalar("SELECT MAX(version) FROM schema_version")
            .fetch_one(pool)
            .await?;

    Ok(version.unwrap_or(0))
}

async fn set_schema_version(pool: &SqlitePool, version: i32) -> Result<()> {
    sqlx::query("INSERT OR IGNORE INTO schema_version (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;

    Ok(())
}

/// Run all pending migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    let current_version = get_schema_version(pool).await?;

    if current_version == CURRENT_SCHEMA_VERSION {
        info!("Database schema is up to date (v{})", current_version);
        return Ok(());
    }

    if current_version > CURRENT_SCHEMA_VERSION {
        warn!(
            "Database schema version ({}) is newer than code version ({}); unknown values will decode to defaults",
            current_version, CURRENT_SCHEMA_VERSION
        );
        return Ok(());
    }

    info!(
        "Running database migrations: v{} -> v{}",
        current_version, CURRENT_SCHEMA_VERSION
    );

    if current_version < 1 {
        migrate_v1(pool).await?;
        set_schema_version(pool, 1).await?;
        info!("Migration v1 completed");
    }

    Ok(())
}

/// v1: legacy rows may hold NULL in `feed_preferences.enqueue_location`
///
/// Rewrites NULL to 0 (GLOBAL). Out-of-range codes are left alone; they
/// already decode to GLOBAL on read and may belong to a newer release.
async fn migrate_v1(pool: &SqlitePool) -> Result<()> {
    let result = sqlx::query(
        "UPDATE feed_preferences SET enqueue_location = 0 WHERE enqueue_location IS NULL",
    )
    .execute(pool)
    .await?;

    if result.rows_affected() > 0 {
        info!(
            "  Backfilled enqueue_location for {} feed(s)",
            result.rows_affected()
        );
    }
    Ok(())
}
