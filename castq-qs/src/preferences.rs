//! Per-feed preferences store
//!
//! Caches [`FeedPreferences`] in memory and writes them to the database. Each
//! feed has its own async lock, so a change to one feed and the flush that
//! persists it run as one unit with respect to other writers of that feed,
//! while different feeds proceed concurrently.
//!
//! Readers go through the cache's `RwLock` and see either the value before a
//! change or the value after it.

use crate::db::{self, feed_preferences as prefs_db};
use crate::error::{Error, Result};
use castq_common::{resolve_effective, EffectiveEnqueueLocation, EnqueueLocation, FeedPreferences};
use sqlx::{Pool, Sqlite};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

pub struct PreferencesStore {
    db: Pool<Sqlite>,
    cache: RwLock<HashMap<i64, FeedPreferences>>,
    feed_locks: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
}

impl PreferencesStore {
    pub fn new(db: Pool<Sqlite>) -> Self {
        Self {
            db,
            cache: RwLock::new(HashMap::new()),
            feed_locks: Mutex::new(HashMap::new()),
        }
    }

    async fn feed_lock(&self, feed_id: i64) -> Arc<Mutex<()>> {
        self.feed_locks
            .lock()
            .await
            .entry(feed_id)
            .or_default()
            .clone()
    }

    /// Current preferences of a feed, loading them on first use
    pub async fn load(&self, feed_id: i64) -> Result<FeedPreferences> {
        if let Some(prefs) = self.cached(feed_id).await {
            return Ok(prefs);
        }

        let lock = self.feed_lock(feed_id).await;
        let _guard = lock.lock().await;
        self.load_locked(feed_id).await
    }

    /// Cached preferences only; never touches the database
    pub async fn cached(&self, feed_id: i64) -> Option<FeedPreferences> {
        self.cache.read().await.get(&feed_id).cloned()
    }

    /// Cache lookup, then database; caller holds the feed lock
    async fn load_locked(&self, feed_id: i64) -> Result<FeedPreferences> {
        if let Some(prefs) = self.cached(feed_id).await {
            return Ok(prefs);
        }

        let prefs = prefs_db::load_feed_preferences(&self.db, feed_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("No preferences for feed {}", feed_id)))?;

        self.cache.write().await.insert(feed_id, prefs.clone());
        Ok(prefs)
    }

    /// Create default preferences for a newly subscribed feed
    ///
    /// Existing preferences are returned unchanged.
    pub async fn create_for_feed(&self, feed_id: i64) -> Result<FeedPreferences> {
        let lock = self.feed_lock(feed_id).await;
        let _guard = lock.lock().await;

        match self.load_locked(feed_id).await {
            Ok(existing) => return Ok(existing),
            Err(Error::NotFound(_)) => {}
            Err(e) => return Err(e),
        }

        let prefs = FeedPreferences::new(feed_id);
        prefs_db::save_feed_preferences(&self.db, &prefs).await?;
        self.cache.write().await.insert(feed_id, prefs.clone());

        info!("Created preferences for feed {}", feed_id);
        Ok(prefs)
    }

    /// Change a feed's enqueue location and persist it
    ///
    /// `None` stores `Global`. If the write fails the new value stays in memory,
    /// marked dirty, and `Error::Persistence` is returned; [`Self::flush`] retries.
    pub async fn set_enqueue_location(
        &self,
        feed_id: i64,
        location: Option<EnqueueLocation>,
    ) -> Result<FeedPreferences> {
        let lock = self.feed_lock(feed_id).await;
        let _guard = lock.lock().await;

        let mut prefs = self.load_locked(feed_id).await?;
        let previous = prefs.enqueue_location();
        prefs.set_enqueue_location(location);

        let outcome = self.write_through(&mut prefs).await;
        self.cache.write().await.insert(feed_id, prefs.clone());

        match outcome {
            Ok(()) => {
                info!(
                    "Feed {} enqueue location: {} -> {}",
                    feed_id,
                    previous,
                    prefs.enqueue_location()
                );
                Ok(prefs)
            }
            Err(e) => {
                warn!(
                    "Feed {} enqueue location set to {} in memory only: {}",
                    feed_id,
                    prefs.enqueue_location(),
                    e
                );
                Err(Error::Persistence {
                    feed_id,
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Write a feed's cached preferences if they have unsaved changes
    pub async fn flush(&self, feed_id: i64) -> Result<()> {
        let lock = self.feed_lock(feed_id).await;
        let _guard = lock.lock().await;

        let Some(mut prefs) = self.cached(feed_id).await else {
            debug!("Feed {} not cached, nothing to flush", feed_id);
            return Ok(());
        };
        if !prefs.is_dirty() {
            return Ok(());
        }

        self.write_through(&mut prefs)
            .await
            .map_err(|e| Error::Persistence {
                feed_id,
                reason: e.to_string(),
            })?;
        self.cache.write().await.insert(feed_id, prefs);

        info!("Flushed preferences of feed {}", feed_id);
        Ok(())
    }

    /// Forget a feed (unsubscribe); returns whether preferences existed
    pub async fn remove(&self, feed_id: i64) -> Result<bool> {
        let lock = self.feed_lock(feed_id).await;
        let existed = {
            let _guard = lock.lock().await;
            let existed = prefs_db::delete_feed_preferences(&self.db, feed_id).await?;
            let cached = self.cache.write().await.remove(&feed_id).is_some();
            existed || cached
        };

        // Only evict when no other task holds a clone (map entry + ours)
        let mut locks = self.feed_locks.lock().await;
        if Arc::strong_count(&lock) == 2 {
            locks.remove(&feed_id);
        }
        drop(locks);

        if existed {
            info!("Removed preferences of feed {}", feed_id);
        }
        Ok(existed)
    }

    /// Global enqueue location from the settings table
    pub async fn global_enqueue_location(&self) -> Result<EffectiveEnqueueLocation> {
        db::get_global_enqueue_location(&self.db).await
    }

    pub async fn set_global_enqueue_location(&self, location: EffectiveEnqueueLocation) -> Result<()> {
        db::set_global_enqueue_location(&self.db, location).await?;
        info!("Global enqueue location set to {}", location);
        Ok(())
    }

    /// Strategy that applies to new items of a feed
    pub async fn effective_enqueue_location(&self, feed_id: i64) -> Result<EffectiveEnqueueLocation> {
        let prefs = self.load(feed_id).await?;
        let global_default = self.global_enqueue_location().await?;
        Ok(resolve_effective(&prefs, global_default))
    }

    /// Save and mark clean; `prefs` stays dirty on failure
    async fn write_through(&self, prefs: &mut FeedPreferences) -> Result<()> {
        prefs_db::save_feed_preferences(&self.db, prefs).await?;
        prefs.mark_clean();
        Ok(())
    }
}
