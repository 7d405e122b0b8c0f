use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use rusqlite::types::Value;
use tokio::sync::Mutex;
use tracing::debug;

use super::params::{Params, sqlite_value_to_json};
use super::{D1Binding, D1PreparedStatement};
use crate::envelope::{D1Meta, D1Result};
use crate::error::D1MiddlewareError;
use crate::results::Row;
use crate::types::ParamConverter;

pub(crate) type SharedSqliteConnection = Arc<Mutex<rusqlite::Connection>>;

/// An in-process binding backed by a local SQLite database.
///
/// Behaves like the runtime binding: engine errors come back inside the envelope rather than as
/// `Err`, and `batch` runs every statement in one transaction that is rolled back on the first
/// failure.
#[derive(Clone)]
pub struct LocalD1Binding {
    conn: SharedSqliteConnection,
}

impl LocalD1Binding {
    /// Open (or create) the database file at `path`.
    ///
    /// # Errors
    /// Returns `D1MiddlewareError::SqliteError` if the file cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, D1MiddlewareError> {
        Self::from_connection(rusqlite::Connection::open(path)?)
    }

    /// Open a private in-memory database.
    ///
    /// # Errors
    /// Returns `D1MiddlewareError::SqliteError` if SQLite cannot allocate the database.
    pub fn open_in_memory() -> Result<Self, D1MiddlewareError> {
        Self::from_connection(rusqlite::Connection::open_in_memory()?)
    }

    /// Wrap an existing connection.
    ///
    /// # Errors
    /// Returns `D1MiddlewareError::SqliteError` if the connection rejects the D1 defaults.
    pub fn from_connection(conn: rusqlite::Connection) -> Result<Self, D1MiddlewareError> {
        // D1 enforces foreign keys on every database.
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

impl std::fmt::Debug for LocalD1Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalD1Binding").finish_non_exhaustive()
    }
}

#[async_trait]
impl D1Binding for LocalD1Binding {
    async fn all(&self, statement: &D1PreparedStatement) -> Result<D1Result, D1MiddlewareError> {
        let statement = statement.clone();
        run_blocking(Arc::clone(&self.conn), move |conn| {
            let params = Params::convert_sql_params(statement.params())?;
            Ok(run_statement(conn, statement.sql(), &params)
                .unwrap_or_else(|e| D1Result::failed(e.to_string())))
        })
        .await
    }

    async fn batch(
        &self,
        statements: &[D1PreparedStatement],
    ) -> Result<Vec<D1Result>, D1MiddlewareError> {
        let statements = statements.to_vec();
        debug!(statements = statements.len(), "running local D1 batch");
        run_blocking(Arc::clone(&self.conn), move |conn| {
            let tx = conn.transaction()?;
            let mut results = Vec::with_capacity(statements.len());
            for statement in &statements {
                let params = Params::convert_sql_params(statement.params())?;
                match run_statement(&tx, statement.sql(), &params) {
                    Ok(result) => results.push(result),
                    Err(e) => {
                        results.push(D1Result::failed(e.to_string()));
                        tx.rollback()?;
                        return Ok(results);
                    }
                }
            }
            tx.commit()?;
            Ok(results)
        })
        .await
    }
}

pub(crate) async fn run_blocking<F, R>(
    conn: SharedSqliteConnection,
    func: F,
) -> Result<R, D1MiddlewareError>
where
    F: FnOnce(&mut rusqlite::Connection) -> Result<R, D1MiddlewareError> + Send + 'static,
    R: Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut guard = conn.blocking_lock();
        func(&mut guard)
    })
    .await
    .map_err(|e| D1MiddlewareError::ExecutionError(format!("sqlite spawn_blocking join error: {e}")))?
}

fn total_changes(conn: &rusqlite::Connection) -> rusqlite::Result<i64> {
    conn.query_row("SELECT total_changes()", [], |row| row.get(0))
}

/// Run one statement and describe it the way D1 does.
///
/// `changes` counts rows written by this statement alone; read-only statements report no
/// changes and no `last_row_id`.
fn run_statement(
    conn: &rusqlite::Connection,
    sql: &str,
    params: &Params,
) -> rusqlite::Result<D1Result> {
    let started = Instant::now();
    let mut stmt = conn.prepare(sql)?;
    let readonly = stmt.readonly();
    let columns: Vec<String> = stmt
        .column_names()
        .iter()
        .map(std::string::ToString::to_string)
        .collect();

    let before = if readonly { 0 } else { total_changes(conn)? };

    let mut rows_out: Vec<Row> = Vec::new();
    let mut rows = stmt.query(params.as_refs().as_slice())?;
    while let Some(row) = rows.next()? {
        let mut record = Row::new();
        for (idx, name) in columns.iter().enumerate() {
            let value: Value = row.get(idx)?;
            record.insert(name.clone(), sqlite_value_to_json(value));
        }
        rows_out.push(record);
    }
    drop(rows);

    // `total_changes()` also counts trigger and foreign-key cascade writes, so it only tells
    // whether this statement wrote anything; `changes()` is the statement's own row count.
    let (written, changes, last_row_id) = if readonly {
        (0, 0, None)
    } else {
        let written = total_changes(conn)? - before;
        let changes = if written > 0 {
            i64::try_from(conn.changes()).unwrap_or(i64::MAX)
        } else {
            0
        };
        (written, changes, Some(conn.last_insert_rowid()))
    };

    let meta = D1Meta {
        changes,
        last_row_id,
        duration: started.elapsed().as_secs_f64() * 1000.0,
        rows_read: rows_out.len() as u64,
        rows_written: u64::try_from(written).unwrap_or_default(),
        changed_db: written > 0,
        size_after: 0,
    };
    Ok(D1Result::with_rows(rows_out, meta))
}
