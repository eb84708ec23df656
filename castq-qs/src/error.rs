//! Error types for castq-qs

use thiserror::Error;

/// Main error type for castq-qs
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database connection or query errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Errors bubbled up from castq-common
    #[error(transparent)]
    Common(#[from] castq_common::Error),

    /// Preferences changed in memory but could not be written out
    ///
    /// The in-memory value is kept; retry with `PreferencesStore::flush`.
    #[error("Failed to persist preferences of feed {feed_id}: {reason}")]
    Persistence { feed_id: i64, reason: String },

    /// Queue management errors
    #[error("Queue error: {0}")]
    Queue(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience Result type using castq-qs Error
pub type Result<T> = std::result::Result<T, Error>;
