use std::borrow::Cow;

use futures_util::TryStreamExt;
use futures_util::future::BoxFuture;
use serde::de::DeserializeOwned;

use crate::compiler::QueryCompiler;
use crate::dialect::Dialect;
use crate::driver::{DatabaseConnection, Driver};
use crate::error::D1MiddlewareError;
use crate::introspect::{
    DatabaseIntrospector, DatabaseMetadata, DatabaseMetadataOptions, TableMetadata,
};
use crate::query::CompiledQuery;
use crate::results::QueryResult;
use crate::translation::{QueryOptions, TranslationMode};
use crate::types::RowValues;

/// Connection type handed out by a dialect's driver.
pub type DialectConnection<D> = <<D as Dialect>::Driver as Driver>::Connection;

/// Runs queries through a [`Dialect`]: compile, acquire a connection, execute, release.
///
/// ```rust,no_run
/// use d1_middleware::prelude::*;
///
/// # async fn demo() -> Result<(), D1MiddlewareError> {
/// let db = Db::new(D1Dialect::new(LocalD1Binding::open_in_memory()?)).await?;
/// db.query("CREATE TABLE kv (key TEXT PRIMARY KEY, value TEXT)").execute().await?;
///
/// let params = [RowValues::Text("a".into()), RowValues::Text("1".into())];
/// let inserted = db
///     .query("INSERT INTO kv (key, value) VALUES ($1, $2)")
///     .params(&params)
///     .execute()
///     .await?;
/// assert_eq!(inserted.num_affected_rows, Some(1));
/// # Ok(()) }
/// ```
pub struct Db<D: Dialect> {
    dialect: D,
    driver: D::Driver,
    compiler: D::Compiler,
    adapter: D::Adapter,
    introspector: D::Introspector,
}

impl<D: Dialect> Db<D> {
    /// Set up the dialect's components and initialise its driver.
    ///
    /// # Errors
    /// Returns an error if the driver fails to initialise.
    pub async fn new(dialect: D) -> Result<Self, D1MiddlewareError> {
        let driver = dialect.create_driver();
        driver.init().await?;
        Ok(Self {
            compiler: dialect.create_query_compiler(),
            adapter: dialect.create_adapter(),
            introspector: dialect.create_introspector(),
            driver,
            dialect,
        })
    }

    #[must_use]
    pub fn dialect(&self) -> &D {
        &self.dialect
    }

    #[must_use]
    pub fn adapter(&self) -> &D::Adapter {
        &self.adapter
    }

    #[must_use]
    pub fn driver(&self) -> &D::Driver {
        &self.driver
    }

    /// Start a fluent query.
    pub fn query<'a>(&'a self, sql: &'a str) -> QueryBuilder<'a, D> {
        QueryBuilder {
            db: self,
            sql,
            params: Cow::Borrowed(&[]),
            options: QueryOptions::default(),
        }
    }

    /// Compile `sql` and `params` with the dialect's compiler.
    #[must_use]
    pub fn compile(&self, sql: &str, params: &[RowValues], options: QueryOptions) -> CompiledQuery {
        self.compiler.compile(sql, params, options)
    }

    /// Execute an already-compiled query on a freshly acquired connection.
    ///
    /// The connection is released whether or not the statement succeeds.
    ///
    /// # Errors
    /// Returns an error if acquisition, execution, or release fails.
    pub async fn execute(&self, query: &CompiledQuery) -> Result<QueryResult, D1MiddlewareError> {
        let conn = self.driver.acquire_connection().await?;
        let result = conn.execute_query(query).await;
        self.driver.release_connection(conn).await?;
        result
    }

    /// Execute a query through the connection's streaming path, collecting every chunk.
    ///
    /// # Errors
    /// Returns an error if the connection cannot stream; D1 connections never can.
    pub async fn execute_streamed(
        &self,
        query: &CompiledQuery,
        chunk_size: usize,
    ) -> Result<Vec<QueryResult>, D1MiddlewareError> {
        let conn = self.driver.acquire_connection().await?;
        let chunks = match conn.stream_query(query, chunk_size) {
            Ok(stream) => stream.try_collect::<Vec<_>>().await,
            Err(e) => Err(e),
        };
        self.driver.release_connection(conn).await?;
        chunks
    }

    /// Run `work` inside a transaction on one connection, committing on success and rolling
    /// back on failure.
    ///
    /// # Errors
    /// Returns the error from beginning the transaction (always, on D1), from `work`, or from
    /// commit/rollback.
    pub async fn transaction<F, R>(&self, work: F) -> Result<R, D1MiddlewareError>
    where
        F: for<'c> FnOnce(&'c DialectConnection<D>) -> BoxFuture<'c, Result<R, D1MiddlewareError>>,
    {
        let conn = self.driver.acquire_connection().await?;
        if let Err(e) = self.driver.begin_transaction(&conn).await {
            self.driver.release_connection(conn).await?;
            return Err(e);
        }

        let outcome = work(&conn).await;
        let finished = if outcome.is_ok() {
            self.driver.commit_transaction(&conn).await
        } else {
            self.driver.rollback_transaction(&conn).await
        };
        self.driver.release_connection(conn).await?;
        finished?;
        outcome
    }

    /// List user tables and their columns.
    ///
    /// # Errors
    /// Returns an error if a connection cannot be acquired or an introspection query fails.
    pub async fn get_tables(
        &self,
        options: DatabaseMetadataOptions,
    ) -> Result<Vec<TableMetadata>, D1MiddlewareError> {
        let conn = self.driver.acquire_connection().await?;
        let tables = self.introspector.get_tables(&conn, options).await;
        self.driver.release_connection(conn).await?;
        tables
    }

    /// Tables plus anything else the introspector reports.
    ///
    /// # Errors
    /// Returns an error if a connection cannot be acquired or an introspection query fails.
    pub async fn get_metadata(
        &self,
        options: DatabaseMetadataOptions,
    ) -> Result<DatabaseMetadata, D1MiddlewareError> {
        let conn = self.driver.acquire_connection().await?;
        let metadata = self.introspector.get_metadata(&conn, options).await;
        self.driver.release_connection(conn).await?;
        metadata
    }

    /// Tear down the driver.
    ///
    /// # Errors
    /// Returns an error if the driver fails to shut down.
    pub async fn destroy(self) -> Result<(), D1MiddlewareError> {
        self.driver.destroy().await
    }
}

/// Fluent builder for a single statement.
pub struct QueryBuilder<'a, D: Dialect> {
    db: &'a Db<D>,
    sql: &'a str,
    params: Cow<'a, [RowValues]>,
    options: QueryOptions,
}

impl<'a, D: Dialect> QueryBuilder<'a, D> {
    /// Provide parameters for this statement.
    #[must_use]
    pub fn params(mut self, params: &'a [RowValues]) -> Self {
        self.params = Cow::Borrowed(params);
        self
    }

    /// Provide owned parameters for this statement.
    #[must_use]
    pub fn bind(mut self, params: Vec<RowValues>) -> Self {
        self.params = Cow::Owned(params);
        self
    }

    #[must_use]
    pub fn options(mut self, options: QueryOptions) -> Self {
        self.options = options;
        self
    }

    /// Override placeholder translation for this statement.
    #[must_use]
    pub fn translation(mut self, translation: TranslationMode) -> Self {
        self.options.translation = translation;
        self
    }

    #[must_use]
    pub fn compile(&self) -> CompiledQuery {
        self.db.compile(self.sql, &self.params, self.options)
    }

    /// Execute and return the raw result.
    ///
    /// # Errors
    /// Returns an error if the statement fails.
    pub async fn execute(self) -> Result<QueryResult, D1MiddlewareError> {
        let compiled = self.compile();
        self.db.execute(&compiled).await
    }

    /// Execute and deserialize every returned row.
    ///
    /// # Errors
    /// Returns an error if the statement fails or a row does not match `T`.
    pub async fn fetch_all<T: DeserializeOwned>(self) -> Result<Vec<T>, D1MiddlewareError> {
        self.execute().await?.rows_as()
    }

    /// Execute and deserialize the first returned row, if any.
    ///
    /// # Errors
    /// Returns an error if the statement fails or the row does not match `T`.
    pub async fn fetch_optional<T: DeserializeOwned>(
        self,
    ) -> Result<Option<T>, D1MiddlewareError> {
        Ok(self.fetch_all().await?.into_iter().next())
    }
}
