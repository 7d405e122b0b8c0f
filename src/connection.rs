use async_trait::async_trait;
use tracing::{debug, warn};

use crate::driver::{DatabaseConnection, QueryStream};
use crate::error::D1MiddlewareError;
use crate::query::CompiledQuery;
use crate::results::QueryResult;
use crate::transform::build_query_result;
use crate::transport::StatementExecutor;

/// A logical connection to D1: one statement at a time, no transactions, no streaming.
///
/// Holds nothing but the transport session it was opened with, so calls are independent.
pub struct D1Connection<S> {
    session: S,
}

impl<S: StatementExecutor> D1Connection<S> {
    pub(crate) fn new(session: S) -> Self {
        Self { session }
    }

    /// Always fails: D1 exposes no cross-statement transactions through these transports.
    ///
    /// # Errors
    /// Always returns `D1MiddlewareError::Unsupported`.
    #[allow(clippy::unused_async)]
    pub async fn begin_transaction(&self) -> Result<(), D1MiddlewareError> {
        warn!("rejected begin_transaction on D1 connection");
        Err(D1MiddlewareError::transactions_unsupported())
    }

    /// Always fails; see [`begin_transaction`](Self::begin_transaction).
    ///
    /// # Errors
    /// Always returns `D1MiddlewareError::Unsupported`.
    #[allow(clippy::unused_async)]
    pub async fn commit_transaction(&self) -> Result<(), D1MiddlewareError> {
        warn!("rejected commit_transaction on D1 connection");
        Err(D1MiddlewareError::transactions_unsupported())
    }

    /// Always fails; see [`begin_transaction`](Self::begin_transaction).
    ///
    /// # Errors
    /// Always returns `D1MiddlewareError::Unsupported`.
    #[allow(clippy::unused_async)]
    pub async fn rollback_transaction(&self) -> Result<(), D1MiddlewareError> {
        warn!("rejected rollback_transaction on D1 connection");
        Err(D1MiddlewareError::transactions_unsupported())
    }
}

impl<S> std::fmt::Debug for D1Connection<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("D1Connection").finish_non_exhaustive()
    }
}

#[async_trait]
impl<S: StatementExecutor + 'static> DatabaseConnection for D1Connection<S> {
    async fn execute_query(&self, query: &CompiledQuery) -> Result<QueryResult, D1MiddlewareError> {
        debug!(sql = %query.sql, params = query.parameters.len(), "executing D1 statement");
        let result = self.session.execute_statement(query).await.inspect_err(|e| {
            warn!(sql = %query.sql, error = %e, "D1 statement failed");
        })?;

        if let Some(message) = &result.error {
            warn!(sql = %query.sql, error = %message, "D1 statement failed");
            return Err(D1MiddlewareError::ExecutionError(message.clone()));
        }

        Ok(build_query_result(&result))
    }

    fn stream_query(
        &self,
        _query: &CompiledQuery,
        _chunk_size: usize,
    ) -> Result<QueryStream<'_>, D1MiddlewareError> {
        Err(D1MiddlewareError::streaming_unsupported())
    }
}
