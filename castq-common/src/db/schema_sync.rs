//! Automatic schema synchronization
//!
//! Tables declare the columns they expect through [`TableSchema`]. On startup,
//! after `CREATE TABLE IF NOT EXISTS` and before versioned migrations, missing
//! columns are added with `ALTER TABLE ... ADD COLUMN`. This is how databases
//! written by older releases pick up new columns (for example
//! `feed_preferences.enqueue_location`) with a safe default.
//!
//! Type and constraint drift is only reported; fixing it needs a migration.

use crate::Result;
use sqlx::{Row, SqlitePool};
use tracing::{info, warn};

/// Expected column with the constraints `ADD COLUMN` can honour
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefinition {
    pub name: String,
    pub sql_type: String,
    pub not_null: bool,
    pub primary_key: bool,
    pub default_value: Option<String>,
}

impl ColumnDefinition {
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
            not_null: false,
            primary_key: false,
            default_value: None,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    /// SQL literal used as DEFAULT (quote text values yourself)
    pub fn default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Column clause for `ALTER TABLE ... ADD COLUMN`
    ///
    /// SQLite accepts NOT NULL on an added column only together with a DEFAULT.
    fn add_column_clause(&self) -> String {
        let mut clause = format!("{} {}", self.name, self.sql_type);
        match (&self.default_value, self.not_null) {
            (Some(default), true) => clause.push_str(&format!(" NOT NULL DEFAULT {}", default)),
            (Some(default), false) => clause.push_str(&format!(" DEFAULT {}", default)),
            (None, _) => {}
        }
        clause
    }
}

/// Column as reported by `PRAGMA table_info`
#[derive(Debug, Clone)]
pub struct ActualColumn {
    pub cid: i32,
    pub name: String,
    pub type_name: String,
    pub not_null: bool,
    pub default_value: Option<String>,
    pub pk: bool,
}

/// Difference between the declared and the actual schema
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaDrift {
    MissingColumn {
        table: String,
        column: ColumnDefinition,
    },
    TypeMismatch {
        table: String,
        column: String,
        expected: String,
        actual: String,
    },
}

/// Declared schema of one table
pub trait TableSchema {
    fn table_name() -> &'static str;

    fn expected_columns() -> Vec<ColumnDefinition>;
}

/// Read a table's columns ordered by position
pub async fn introspect_table(pool: &SqlitePool, table_name: &str) -> Result<Vec<ActualColumn>> {
    let rows = sqlx::query(&format!("PRAGMA table_info({})", table_name))
        .fetch_all(pool)
        .await?;

    let mut columns: Vec<ActualColumn> = rows
        .iter()
        .map(|row| ActualColumn {
            cid: row.get("cid"),
            name: row.get("name"),
            type_name: row.get("type"),
            not_null: row.get::<i32, _>("notnull") != 0,
            default_value: row.get("dflt_value"),
            pk: row.get::<i32, _>("pk") != 0,
        })
        .collect();
    columns.sort_by_key(|c| c.cid);

    Ok(columns)
}

pub async fn table_exists(pool: &SqlitePool, table_name: &str) -> Result<bool> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?)",
    )
    .bind(table_name)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

/// Compare declared columns against the live table
pub fn diff_schema(
    table_name: &str,
    expected: &[ColumnDefinition],
    actual: &[ActualColumn],
) -> Vec<SchemaDrift> {
    expected
        .iter()
        .filter_map(|expected_col| {
            match actual.iter().find(|c| c.name == expected_col.name) {
                None => Some(SchemaDrift::MissingColumn {
                    table: table_name.to_string(),
                    column: expected_col.clone(),
                }),
                Some(actual_col)
                    if !same_affinity(&expected_col.sql_type, &actual_col.type_name) =>
                {
                    Some(SchemaDrift::TypeMismatch {
                        table: table_name.to_string(),
                        column: expected_col.name.clone(),
                        expected: expected_col.sql_type.clone(),
                        actual: actual_col.type_name.clone(),
                    })
                }
                Some(_) => None,
            }
        })
        .collect()
}

/// SQLite type affinity of a declared type name
fn affinity(type_name: &str) -> &'static str {
    let upper = type_name.to_uppercase();
    if upper.contains("INT") {
        "INTEGER"
    } else if upper.contains("CHAR") || upper.contains("CLOB") || upper.contains("TEXT") {
        "TEXT"
    } else if upper.contains("REAL") || upper.contains("FLOA") || upper.contains("DOUB") {
        "REAL"
    } else if upper.is_empty() || upper.contains("BLOB") {
        "BLOB"
    } else {
        "NUMERIC"
    }
}

fn same_affinity(expected: &str, actual: &str) -> bool {
    affinity(expected) == affinity(actual)
}

/// Add any missing columns of `T`'s table
///
/// A table that does not exist yet is skipped; it is created elsewhere with
/// the full column set.
pub async fn sync_table<T: TableSchema>(pool: &SqlitePool) -> Result<()> {
    let table_name = T::table_name();

    if !table_exists(pool, table_name).await? {
        warn!("Schema sync: table '{}' does not exist, skipping", table_name);
        return Ok(());
    }

    let actual = introspect_table(pool, table_name).await?;
    let drift = diff_schema(table_name, &T::expected_columns(), &actual);

    if drift.is_empty() {
        info!("Schema sync: '{}' up to date", table_name);
        return Ok(());
    }

    for change in drift {
        match change {
            SchemaDrift::MissingColumn { table, column } => {
                add_column(pool, &table, &column).await?;
            }
            SchemaDrift::TypeMismatch {
                table,
                column,
                expected,
                actual,
            } => {
                warn!(
                    "Schema sync: {}.{} is '{}', expected '{}'; needs a manual migration",
                    table, column, actual, expected
                );
            }
        }
    }

    Ok(())
}

async fn add_column(pool: &SqlitePool, table: &str, column: &ColumnDefinition) -> Result<()> {
    if column.primary_key {
        warn!(
            "Schema sync: {}.{} added without PRIMARY KEY (unsupported by ADD COLUMN)",
            table, column.name
        );
    }
    if column.not_null && column.default_value.is_none() {
        warn!(
            "Schema sync: {}.{} added as nullable (NOT NULL needs a DEFAULT)",
            table, column.name
        );
    }

    let sql = format!("ALTER TABLE {} ADD COLUMN {}", table, column.add_column_clause());
    match sqlx::query(&sql).execute(pool).await {
        Ok(_) => {
            info!("Schema sync: added column {}.{}", table, column.name);
            Ok(())
        }
        // Another connection won the race
        Err(sqlx::Error::Database(db_err)) if db_err.message().contains("duplicate column") => {
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
