//! Adding new items to the playback queue
//!
//! Resolves the feed's effective enqueue location, computes the insertion index
//! from a queue snapshot and the currently playing item, and inserts. The queue
//! lock covers snapshot and insert so concurrent enqueues cannot interleave.

use crate::db;
use crate::error::{Error, Result};
use crate::preferences::PreferencesStore;
use castq_common::{EffectiveEnqueueLocation, EnqueuePositionCalculator};
use rand::rngs::StdRng;
use rand::Rng;
use serde::Serialize;
use sqlx::{Pool, Sqlite};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

/// Result of one enqueue request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnqueueOutcome {
    pub queue_entry_id: Uuid,
    pub item_id: i64,
    pub feed_id: i64,
    /// Index of the item in the queue after the call
    pub position: usize,
    pub strategy: EffectiveEnqueueLocation,
    /// The item was queued before the call; nothing changed
    pub already_queued: bool,
}

pub struct EnqueueService<R = StdRng> {
    db: Pool<Sqlite>,
    preferences: Arc<PreferencesStore>,
    calculator: Mutex<EnqueuePositionCalculator<R>>,
}

impl EnqueueService<StdRng> {
    pub fn new(db: Pool<Sqlite>, preferences: Arc<PreferencesStore>) -> Self {
        Self::with_calculator(db, preferences, EnqueuePositionCalculator::new())
    }
}

impl<R: Rng + Send> EnqueueService<R> {
    pub fn with_calculator(
        db: Pool<Sqlite>,
        preferences: Arc<PreferencesStore>,
        calculator: EnqueuePositionCalculator<R>,
    ) -> Self {
        Self {
            db,
            preferences,
            calculator: Mutex::new(calculator),
        }
    }

    /// Add `item_id` from `feed_id` to the queue
    ///
    /// An item that is already queued stays where it is.
    pub async fn enqueue(&self, feed_id: i64, item_id: i64) -> Result<EnqueueOutcome> {
        let strategy = self.preferences.effective_enqueue_location(feed_id).await?;

        let mut calculator = self.calculator.lock().await;

        let queue = db::get_queue_item_ids(&self.db).await?;
        if let Some(position) = queue.iter().position(|&id| id == item_id) {
            debug!("Item {} already queued at {}", item_id, position);
            let row = db::find_by_item(&self.db, item_id)
                .await?
                .ok_or_else(|| Error::Queue(format!("Item {} vanished from queue", item_id)))?;
            let queue_entry_id = Uuid::parse_str(&row.guid)
                .map_err(|e| Error::Queue(format!("Corrupt queue entry id '{}': {}", row.guid, e)))?;
            return Ok(EnqueueOutcome {
                queue_entry_id,
                item_id,
                feed_id,
                position,
                strategy,
                already_queued: true,
            });
        }

        let current = db::get_current_item(&self.db).await?;
        let position = calculator.calculate_position(strategy.into(), &queue, current.as_ref());

        let queue_entry_id = db::insert_at(&self.db, position, item_id, feed_id).await?;

        info!(
            "Enqueued item {} of feed {} at position {} ({})",
            item_id, feed_id, position, strategy
        );
        Ok(EnqueueOutcome {
            queue_entry_id,
            item_id,
            feed_id,
            position,
            strategy,
            already_queued: false,
        })
    }

    /// Remove an item; holds the queue lock like [`Self::enqueue`]
    pub async fn dequeue(&self, item_id: i64) -> Result<()> {
        let _calculator = self.calculator.lock().await;
        db::remove_item(&self.db, item_id).await?;
        info!("Removed item {} from queue", item_id);
        Ok(())
    }

    pub async fn clear(&self) -> Result<u64> {
        let _calculator = self.calculator.lock().await;
        let removed = db::clear_queue(&self.db).await?;
        info!("Cleared queue ({} entries)", removed);
        Ok(removed)
    }

    /// Record which item is playing; `None` means nothing is
    pub async fn set_currently_playing(&self, item_id: Option<i64>) -> Result<()> {
        let _calculator = self.calculator.lock().await;
        db::set_current_item(&self.db, item_id).await
    }
}
