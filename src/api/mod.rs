// API module - D1 over the Cloudflare HTTP API
//
// - config: account/token/database options
// - client: authenticated calls (list, resolve, query)
// - models: request/response bodies
// - params: parameter conversion to the JSON `params` array

pub mod client;
pub mod config;
pub mod models;
pub mod params;

pub use client::{D1Api, QueryOutcome};
pub use config::{D1ApiConfig, D1ApiConfigBuilder};
pub use models::{ApiMessage, ApiQueryResponse, DatabaseRecord};

use std::sync::Arc;

use async_trait::async_trait;

use crate::envelope::D1Result;
use crate::error::D1MiddlewareError;
use crate::query::CompiledQuery;
use crate::transport::{D1Transport, StatementExecutor};

/// Transport over the HTTP API; each acquisition resolves the configured database name.
pub struct ApiTransport {
    client: Arc<D1Api>,
    database_name: String,
}

impl ApiTransport {
    pub(crate) fn new(client: Arc<D1Api>, database_name: String) -> Self {
        Self {
            client,
            database_name,
        }
    }
}

/// A connection's view of one resolved database.
pub struct ApiSession {
    client: Arc<D1Api>,
    database_id: String,
}

impl ApiSession {
    #[must_use]
    pub fn database_id(&self) -> &str {
        &self.database_id
    }
}

#[async_trait]
impl D1Transport for ApiTransport {
    type Session = ApiSession;

    async fn open_session(&self) -> Result<Self::Session, D1MiddlewareError> {
        let database = self
            .client
            .database_from_name(&self.database_name)
            .await?
            .ok_or_else(|| {
                D1MiddlewareError::ConfigError(format!(
                    "Database {} not found",
                    self.database_name
                ))
            })?;

        Ok(ApiSession {
            client: Arc::clone(&self.client),
            database_id: database.uuid,
        })
    }
}

#[async_trait]
impl StatementExecutor for ApiSession {
    async fn execute_statement(
        &self,
        query: &CompiledQuery,
    ) -> Result<D1Result, D1MiddlewareError> {
        match self
            .client
            .query_database(&self.database_id, &query.sql, &query.parameters)
            .await
        {
            QueryOutcome::Success(data) => data.result.into_iter().next().ok_or_else(|| {
                D1MiddlewareError::ExecutionError("D1 API returned no statement results".into())
            }),
            QueryOutcome::Failure(message) => Err(D1MiddlewareError::ExecutionError(message)),
        }
    }
}
