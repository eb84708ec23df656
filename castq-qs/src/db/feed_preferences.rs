//! Feed preferences database access

use crate::error::Result;
use castq_common::db::FeedPreferencesRow;
use castq_common::FeedPreferences;
use sqlx::{Pool, Sqlite};

/// Load one feed's preferences
pub async fn load_feed_preferences(
    db: &Pool<Sqlite>,
    feed_id: i64,
) -> Result<Option<FeedPreferences>> {
    let row: Option<FeedPreferencesRow> =
        sqlx::query_as("SELECT * FROM feed_preferences WHERE feed_id = ?")
            .bind(feed_id)
            .fetch_optional(db)
            .await?;

    Ok(row.map(FeedPreferences::from_row))
}

/// Write every field of `prefs`, inserting the row if it does not exist
pub async fn save_feed_preferences(db: &Pool<Sqlite>, prefs: &FeedPreferences) -> Result<()> {
    let row = prefs.to_row();

    sqlx::query(
        r#"
        INSERT INTO feed_preferences (
            feed_id, auto_download, keep_updated, auto_delete_action, volume_adaption,
            username, password, include_filter, exclude_filter, minimal_duration_filter,
            playback_speed, skip_intro, skip_ending, skip_silence, episode_notification,
            new_episodes_action, tags, enqueue_location
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(feed_id) DO UPDATE SET
            auto_download = excluded.auto_download,
            keep_updated = excluded.keep_updated,
            auto_delete_action = excluded.auto_delete_action,
            volume_adaption = excluded.volume_adaption,
            username = excluded.username,
            password = excluded.password,
            include_filter = excluded.include_filter,
            exclude_filter = excluded.exclude_filter,
            minimal_duration_filter = excluded.minimal_duration_filter,
            playback_speed = excluded.playback_speed,
            skip_intro = excluded.skip_intro,
            skip_ending = excluded.skip_ending,
            skip_silence = excluded.skip_silence,
            episode_notification = excluded.episode_notification,
            new_episodes_action = excluded.new_episodes_action,
            tags = excluded.tags,
            enqueue_location = excluded.enqueue_location
        "#,
    )
    .bind(row.feed_id)
    .bind(row.auto_download)
    .bind(row.keep_updated)
    .bind(row.auto_delete_action)
    .bind(row.volume_adaption)
    .bind(row.username)
    .bind(row.password)
    .bind(row.include_filter)
    .bind(row.exclude_filter)
    .bind(row.minimal_duration_filter)
    .bind(row.playback_speed)
    .bind(row.skip_intro)
    .bind(row.skip_ending)
    .bind(row.skip_silence)
    .bind(row.episode_notification)
    .bind(row.new_episodes_action)
    .bind(row.tags)
    .bind(row.enqueue_location)
    .execute(db)
    .await?;

    Ok(())
}

/// Delete one feed's preferences; returns whether a row existed
pub async fn delete_feed_preferences(db: &Pool<Sqlite>, feed_id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM feed_preferences WHERE feed_id = ?")
        .bind(feed_id)
        .execute(db)
        .await?;

    Ok(result.rows_affected() > 0)
}
