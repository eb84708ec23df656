//! Database access for the queue service

pub mod feed_preferences;
pub mod queue;
pub mod settings;

pub use feed_preferences::*;
pub use queue::*;
pub use settings::*;

#[cfg(test)]
pub(crate) mod test_support {
    use castq_common::db::prepare_schema;
    use castq_common::EffectiveEnqueueLocation;
    use sqlx::sqlite::SqlitePoolOptions;
    use sqlx::{Pool, Sqlite};

    /// Fully prepared in-memory database
    ///
    /// One connection only: every new `:memory:` connection is a separate database.
    pub async fn setup_test_db() -> Pool<Sqlite> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        prepare_schema(&pool, EffectiveEnqueueLocation::Back)
            .await
            .unwrap();
        pool
    }
}
