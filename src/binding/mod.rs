// Binding module - native in-process access to a D1 database
//
// - mod: the binding contract and the transport the binding dialect drives
// - local: a SQLite-backed binding for local development and tests
// - params: parameter conversion between middleware and rusqlite types

#[cfg(feature = "sqlite")]
pub mod local;
#[cfg(feature = "sqlite")]
pub mod params;

#[cfg(feature = "sqlite")]
pub use local::LocalD1Binding;

use std::sync::Arc;

use async_trait::async_trait;

use crate::envelope::D1Result;
use crate::error::D1MiddlewareError;
use crate::query::CompiledQuery;
use crate::transport::{D1Transport, StatementExecutor};
use crate::types::RowValues;

/// A statement prepared against a binding, with its parameters bound.
#[derive(Debug, Clone, PartialEq)]
pub struct D1PreparedStatement {
    sql: String,
    params: Vec<RowValues>,
}

impl D1PreparedStatement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Bind positional parameters, replacing any bound earlier.
    #[must_use]
    pub fn bind(mut self, params: Vec<RowValues>) -> Self {
        self.params = params;
        self
    }

    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    #[must_use]
    pub fn params(&self) -> &[RowValues] {
        &self.params
    }
}

impl From<&CompiledQuery> for D1PreparedStatement {
    fn from(query: &CompiledQuery) -> Self {
        D1PreparedStatement::new(query.sql.clone()).bind(query.parameters.clone())
    }
}

/// The native D1 binding a serverless runtime hands to application code.
///
/// Mirrors the runtime's shape: `prepare(sql).bind(..)` followed by `all()` for one statement,
/// or `batch([...])` to run several statements atomically.
#[async_trait]
pub trait D1Binding: Send + Sync {
    /// Prepare `sql` for binding.
    fn prepare(&self, sql: &str) -> D1PreparedStatement {
        D1PreparedStatement::new(sql)
    }

    /// Run one statement and return every row it produced.
    ///
    /// # Errors
    /// Returns an error when the binding itself fails; engine errors may instead be reported in
    /// the envelope's `error` field.
    async fn all(&self, statement: &D1PreparedStatement) -> Result<D1Result, D1MiddlewareError>;

    /// Run `statements` as one atomic unit, returning one envelope per statement executed.
    ///
    /// # Errors
    /// Returns an error when the binding itself fails.
    async fn batch(
        &self,
        statements: &[D1PreparedStatement],
    ) -> Result<Vec<D1Result>, D1MiddlewareError>;
}

#[async_trait]
impl<B: D1Binding + ?Sized> D1Binding for Arc<B> {
    fn prepare(&self, sql: &str) -> D1PreparedStatement {
        (**self).prepare(sql)
    }

    async fn all(&self, statement: &D1PreparedStatement) -> Result<D1Result, D1MiddlewareError> {
        (**self).all(statement).await
    }

    async fn batch(
        &self,
        statements: &[D1PreparedStatement],
    ) -> Result<Vec<D1Result>, D1MiddlewareError> {
        (**self).batch(statements).await
    }
}

/// Transport over a native binding; acquiring a connection never fails.
pub struct BindingTransport<B> {
    binding: Arc<B>,
}

impl<B> BindingTransport<B> {
    pub(crate) fn new(binding: Arc<B>) -> Self {
        Self { binding }
    }
}

/// Per-connection handle onto the shared binding.
pub struct BindingSession<B> {
    binding: Arc<B>,
}

#[async_trait]
impl<B: D1Binding + 'static> D1Transport for BindingTransport<B> {
    type Session = BindingSession<B>;

    async fn open_session(&self) -> Result<Self::Session, D1MiddlewareError> {
        Ok(BindingSession {
            binding: Arc::clone(&self.binding),
        })
    }
}

#[async_trait]
impl<B: D1Binding + 'static> StatementExecutor for BindingSession<B> {
    async fn execute_statement(
        &self,
        query: &CompiledQuery,
    ) -> Result<D1Result, D1MiddlewareError> {
        let statement = self
            .binding
            .prepare(&query.sql)
            .bind(query.parameters.clone());
        self.binding.all(&statement).await
    }
}
