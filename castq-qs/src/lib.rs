//! # castq Queue Service Library (castq-qs)
//!
//! Owns the per-feed preferences persistence boundary, the global enqueue
//! location setting and the playback queue, and exposes them over HTTP.
//!
//! **Flow:** a new item for a feed → effective enqueue location (feed override or
//! global default) → insertion index from the queue snapshot and the currently
//! playing item → insert and persist the new queue order.

pub mod api;
pub mod config;
pub mod db;
pub mod enqueue;
pub mod error;
pub mod preferences;

pub use enqueue::{EnqueueOutcome, EnqueueService};
pub use error::{Error, Result};
pub use preferences::PreferencesStore;
