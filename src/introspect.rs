use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::compiler::{QueryCompiler, SqliteQueryCompiler};
use crate::driver::DatabaseConnection;
use crate::error::D1MiddlewareError;
use crate::query::CompiledQuery;
use crate::types::RowValues;

/// Table `wrangler d1 migrations apply` records applied migrations in.
pub const DEFAULT_MIGRATION_TABLE: &str = "d1_migrations";
/// Lock table for migration runners that take a lock through
/// [`DialectAdapter::acquire_migration_lock`](crate::adapter::DialectAdapter::acquire_migration_lock).
/// Wrangler takes no lock, and [`SqliteAdapter`](crate::adapter::SqliteAdapter)'s lock is a
/// no-op, so this table only exists when other tooling creates it.
pub const DEFAULT_MIGRATION_LOCK_TABLE: &str = "d1_migrations_lock";

/// Tables owned by the engine itself: D1's `_cf_` tables and SQLite's reserved `sqlite_` ones.
const INTERNAL_TABLE_PREFIXES: [&str; 2] = ["_cf_", "sqlite_"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DatabaseMetadataOptions {
    /// Include the migration bookkeeping tables.
    pub with_internal_tables: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMetadata {
    pub name: String,
    pub data_type: String,
    pub is_nullable: bool,
    pub is_autoincrementing: bool,
    pub has_default_value: bool,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableMetadata {
    pub name: String,
    pub schema: Option<String>,
    pub is_view: bool,
    pub columns: Vec<ColumnMetadata>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaMetadata {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseMetadata {
    pub tables: Vec<TableMetadata>,
}

/// Discovers the schema of an existing database.
#[async_trait]
pub trait DatabaseIntrospector: Send + Sync {
    /// SQLite has no schemas in the Postgres sense, so the default is an empty list.
    async fn get_schemas(
        &self,
        _conn: &dyn DatabaseConnection,
    ) -> Result<Vec<SchemaMetadata>, D1MiddlewareError> {
        Ok(Vec::new())
    }

    /// List user tables and their columns.
    async fn get_tables(
        &self,
        conn: &dyn DatabaseConnection,
        options: DatabaseMetadataOptions,
    ) -> Result<Vec<TableMetadata>, D1MiddlewareError>;

    async fn get_metadata(
        &self,
        conn: &dyn DatabaseConnection,
        options: DatabaseMetadataOptions,
    ) -> Result<DatabaseMetadata, D1MiddlewareError> {
        Ok(DatabaseMetadata {
            tables: self.get_tables(conn, options).await?,
        })
    }
}

fn is_visible_table(name: &str, options: DatabaseMetadataOptions) -> bool {
    if INTERNAL_TABLE_PREFIXES
        .iter()
        .any(|prefix| name.starts_with(prefix))
    {
        return false;
    }
    options.with_internal_tables
        || (name != DEFAULT_MIGRATION_TABLE && name != DEFAULT_MIGRATION_LOCK_TABLE)
}

#[derive(Debug, Deserialize)]
struct TableListEntry {
    schema: String,
    name: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct TableInfoRow {
    name: String,
    #[serde(rename = "type")]
    data_type: String,
    notnull: i64,
    dflt_value: Option<JsonValue>,
    pk: i64,
}

/// Turn `table_info` rows into column metadata.
///
/// A lone `INTEGER PRIMARY KEY` aliases the rowid and can never hold NULL, even though
/// SQLite reports `notnull = 0` for it.
fn columns_from_table_info(
    rows: Vec<TableInfoRow>,
    autoincrement_column: Option<&str>,
) -> Vec<ColumnMetadata> {
    let pk_columns = rows.iter().filter(|row| row.pk > 0).count();
    rows.into_iter()
        .map(|row| {
            let is_rowid_alias =
                pk_columns == 1 && row.pk > 0 && row.data_type.eq_ignore_ascii_case("INTEGER");
            ColumnMetadata {
                is_nullable: row.notnull == 0 && !is_rowid_alias,
                is_autoincrementing: autoincrement_column.is_some_and(|col| col == row.name),
                has_default_value: row.dflt_value.is_some(),
                data_type: row.data_type,
                name: row.name,
                comment: None,
            }
        })
        .collect()
}

/// Introspector for the native binding, built on `PRAGMA table_list` / `PRAGMA table_info`.
///
/// D1 refuses direct reads of some of SQLite's catalog tables, so nothing here touches
/// `sqlite_master`.
#[derive(Debug, Clone, Copy, Default)]
pub struct D1Introspector {
    compiler: SqliteQueryCompiler,
}

impl D1Introspector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DatabaseIntrospector for D1Introspector {
    async fn get_tables(
        &self,
        conn: &dyn DatabaseConnection,
        options: DatabaseMetadataOptions,
    ) -> Result<Vec<TableMetadata>, D1MiddlewareError> {
        let listing = conn
            .execute_query(&CompiledQuery::raw("PRAGMA table_list"))
            .await?;
        let entries: Vec<TableListEntry> = listing.rows_as()?;

        let mut tables = Vec::new();
        for entry in entries
            .into_iter()
            .filter(|entry| is_visible_table(&entry.name, options))
        {
            let sql = format!(
                "PRAGMA {}.table_info({})",
                self.compiler.quote_identifier(&entry.schema),
                self.compiler.quote_identifier(&entry.name)
            );
            let info = conn.execute_query(&CompiledQuery::raw(sql)).await?;
            let columns = columns_from_table_info(info.rows_as()?, None);
            debug!(table = %entry.name, columns = columns.len(), "introspected table");

            tables.push(TableMetadata {
                is_view: entry.kind == "view",
                schema: Some(entry.schema),
                name: entry.name,
                columns,
            });
        }
        Ok(tables)
    }
}

#[derive(Debug, Deserialize)]
struct MasterEntry {
    name: String,
    #[serde(rename = "type")]
    kind: String,
    sql: Option<String>,
}

static AUTOINCREMENT_COLUMN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)[(,]\s*["`\[]?(\w+)["`\]]?[^,()]*\bautoincrement\b"#)
        .expect("autoincrement pattern is valid")
});

fn autoincrement_column(create_sql: &str) -> Option<&str> {
    AUTOINCREMENT_COLUMN
        .captures(create_sql)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Catalog-based SQLite introspector, used where `sqlite_master` is readable (the HTTP API).
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteIntrospector;

impl SqliteIntrospector {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DatabaseIntrospector for SqliteIntrospector {
    async fn get_tables(
        &self,
        conn: &dyn DatabaseConnection,
        options: DatabaseMetadataOptions,
    ) -> Result<Vec<TableMetadata>, D1MiddlewareError> {
        let listing = conn
            .execute_query(&CompiledQuery::raw(
                "SELECT name, type, sql FROM sqlite_master \
                 WHERE type IN ('table', 'view') AND name NOT LIKE 'sqlite_%' \
                 ORDER BY name",
            ))
            .await?;
        let entries: Vec<MasterEntry> = listing.rows_as()?;

        let mut tables = Vec::new();
        for entry in entries
            .into_iter()
            .filter(|entry| is_visible_table(&entry.name, options))
        {
            let info = conn
                .execute_query(&CompiledQuery::new(
                    "SELECT cid, name, type, \"notnull\", dflt_value, pk \
                     FROM pragma_table_info(?1) ORDER BY cid",
                    vec![RowValues::Text(entry.name.clone())],
                ))
                .await?;
            let autoincrement = entry.sql.as_deref().and_then(autoincrement_column);
            let columns = columns_from_table_info(info.rows_as()?, autoincrement);

            tables.push(TableMetadata {
                is_view: entry.kind == "view",
                schema: None,
                name: entry.name,
                columns,
            });
        }
        Ok(tables)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hides_internal_and_migration_tables() {
        let defaults = DatabaseMetadataOptions::default();
        assert!(!is_visible_table("_cf_KV", defaults));
        assert!(!is_visible_table("sqlite_sequence", defaults));
        assert!(!is_visible_table(DEFAULT_MIGRATION_TABLE, defaults));
        assert!(!is_visible_table(DEFAULT_MIGRATION_LOCK_TABLE, defaults));
        assert!(is_visible_table("kv", defaults));

        let with_internal = DatabaseMetadataOptions {
            with_internal_tables: true,
        };
        assert!(is_visible_table(DEFAULT_MIGRATION_TABLE, with_internal));
        assert!(!is_visible_table("_cf_KV", with_internal));
    }

    #[test]
    fn finds_autoincrement_column() {
        assert_eq!(
            autoincrement_column(
                "CREATE TABLE t (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT)"
            ),
            Some("id")
        );
        assert_eq!(
            autoincrement_column(
                "CREATE TABLE t (price DECIMAL(10,2), \"row_id\" integer primary key autoincrement)"
            ),
            Some("row_id")
        );
        assert_eq!(autoincrement_column("CREATE TABLE t (id INTEGER PRIMARY KEY)"), None);
    }

    #[test]
    fn rowid_alias_is_not_nullable() {
        let rows = vec![
            TableInfoRow {
                name: "id".into(),
                data_type: "INTEGER".into(),
                notnull: 0,
                dflt_value: None,
                pk: 1,
            },
            TableInfoRow {
                name: "name".into(),
                data_type: "TEXT".into(),
                notnull: 1,
                dflt_value: Some(JsonValue::String("'x'".into())),
                pk: 0,
            },
            TableInfoRow {
                name: "note".into(),
                data_type: "TEXT".into(),
                notnull: 0,
                dflt_value: None,
                pk: 0,
            },
        ];
        let columns = columns_from_table_info(rows, None);
        assert!(!columns[0].is_nullable);
        assert!(!columns[0].has_default_value);
        assert!(!columns[1].is_nullable);
        assert!(columns[1].has_default_value);
        assert!(columns[2].is_nullable);
        assert!(columns.iter().all(|c| !c.is_autoincrementing));
    }
}
