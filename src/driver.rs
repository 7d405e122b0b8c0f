use std::sync::Arc;

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use tracing::debug;

use crate::connection::D1Connection;
use crate::error::D1MiddlewareError;
use crate::query::CompiledQuery;
use crate::results::QueryResult;
use crate::transport::D1Transport;

/// Chunks of a streamed query.
pub type QueryStream<'a> = BoxStream<'a, Result<QueryResult, D1MiddlewareError>>;

/// The object a statement is executed through.
#[async_trait]
pub trait DatabaseConnection: Send + Sync {
    /// Execute one compiled statement.
    ///
    /// # Errors
    /// Returns an error if the engine or transport rejects the statement.
    async fn execute_query(&self, query: &CompiledQuery) -> Result<QueryResult, D1MiddlewareError>;

    /// Stream the statement's results in chunks of `chunk_size` rows.
    ///
    /// # Errors
    /// Returns an error if streaming is unavailable or the statement cannot start.
    fn stream_query(
        &self,
        query: &CompiledQuery,
        chunk_size: usize,
    ) -> Result<QueryStream<'_>, D1MiddlewareError>;
}

/// Connection lifecycle for one dialect.
#[async_trait]
pub trait Driver: Send + Sync {
    type Connection: DatabaseConnection + 'static;

    /// One-time setup before the first acquisition.
    async fn init(&self) -> Result<(), D1MiddlewareError>;

    /// Hand out a connection.
    async fn acquire_connection(&self) -> Result<Self::Connection, D1MiddlewareError>;

    async fn begin_transaction(&self, conn: &Self::Connection) -> Result<(), D1MiddlewareError>;

    async fn commit_transaction(&self, conn: &Self::Connection) -> Result<(), D1MiddlewareError>;

    async fn rollback_transaction(&self, conn: &Self::Connection) -> Result<(), D1MiddlewareError>;

    /// Give a connection back once the caller is done with it.
    async fn release_connection(&self, conn: Self::Connection) -> Result<(), D1MiddlewareError>;

    /// Tear down anything `init` set up.
    async fn destroy(&self) -> Result<(), D1MiddlewareError>;
}

/// Driver shared by both D1 dialects, parameterised over the transport.
///
/// Nothing is pooled: every acquisition opens a new session and release drops it.
pub struct D1Driver<T> {
    transport: Arc<T>,
}

impl<T> D1Driver<T> {
    #[must_use]
    pub fn new(transport: Arc<T>) -> Self {
        Self { transport }
    }
}

impl<T> Clone for D1Driver<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
        }
    }
}

impl<T> std::fmt::Debug for D1Driver<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("D1Driver").finish_non_exhaustive()
    }
}

#[async_trait]
impl<T: D1Transport + 'static> Driver for D1Driver<T> {
    type Connection = D1Connection<T::Session>;

    async fn init(&self) -> Result<(), D1MiddlewareError> {
        Ok(())
    }

    async fn acquire_connection(&self) -> Result<Self::Connection, D1MiddlewareError> {
        let session = self.transport.open_session().await?;
        debug!("acquired D1 connection");
        Ok(D1Connection::new(session))
    }

    async fn begin_transaction(&self, conn: &Self::Connection) -> Result<(), D1MiddlewareError> {
        conn.begin_transaction().await
    }

    async fn commit_transaction(&self, conn: &Self::Connection) -> Result<(), D1MiddlewareError> {
        conn.commit_transaction().await
    }

    async fn rollback_transaction(&self, conn: &Self::Connection) -> Result<(), D1MiddlewareError> {
        conn.rollback_transaction().await
    }

    async fn release_connection(&self, _conn: Self::Connection) -> Result<(), D1MiddlewareError> {
        debug!("released D1 connection");
        Ok(())
    }

    async fn destroy(&self) -> Result<(), D1MiddlewareError> {
        Ok(())
    }
}
