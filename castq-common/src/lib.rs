//! # castq Common Library
//!
//! Shared code for the castq feed-subscription services including:
//! - Enqueue location policy (strategy codes, resolution, queue position calculation)
//! - Per-feed preferences and their persisted row form
//! - Database initialization, schema synchronization and migrations
//! - Configuration loading

pub mod config;
#[cfg(feature = "sqlx")]
pub mod db;
pub mod enqueue_location;
pub mod error;
pub mod feed_preferences;
pub mod queue_position;
pub mod resolution;

pub use enqueue_location::{EffectiveEnqueueLocation, EnqueueLocation};
pub use error::{Error, Result};
pub use feed_preferences::FeedPreferences;
pub use queue_position::EnqueuePositionCalculator;
pub use resolution::{resolve_effective, resolve_location};
