//! The seam between the shared connection/driver logic and a concrete D1 transport.

use async_trait::async_trait;

use crate::envelope::D1Result;
use crate::error::D1MiddlewareError;
use crate::query::CompiledQuery;

/// Runs single statements for one acquired connection.
#[async_trait]
pub trait StatementExecutor: Send + Sync {
    /// Run one statement and return D1's envelope for it.
    ///
    /// A statement the engine rejected may come back either as `Err` or as an envelope whose
    /// `error` is set; the connection treats both as failures.
    ///
    /// # Errors
    /// Returns `D1MiddlewareError::ExecutionError` when the transport could not run the statement.
    async fn execute_statement(&self, query: &CompiledQuery) -> Result<D1Result, D1MiddlewareError>;
}

/// A way of reaching a D1 database.
///
/// Opening a session is where per-connection setup happens (resolving a database name over
/// HTTP, for instance); sessions carry no mutable state.
#[async_trait]
pub trait D1Transport: Send + Sync {
    type Session: StatementExecutor + 'static;

    /// Open a fresh session for a newly acquired connection.
    ///
    /// # Errors
    /// Returns an error when the configured database cannot be reached or resolved.
    async fn open_session(&self) -> Result<Self::Session, D1MiddlewareError>;
}
