//! Database initialization, schema maintenance and row models

pub mod init;
pub mod migrations;
pub mod models;
pub mod schema_sync;
pub mod table_schemas;

pub use init::*;
pub use migrations::run_migrations;
pub use models::*;
pub use table_schemas::sync_all_table_schemas;
