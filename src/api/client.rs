use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use tracing::{debug, warn};

use super::config::D1ApiConfig;
use super::models::{
    ApiErrorBody, ApiQueryResponse, DatabaseRecord, ListDatabasesResponse, QueryRequest,
};
use super::params::Params;
use crate::error::D1MiddlewareError;
use crate::types::{ParamConverter, RowValues};

/// Outcome of a statement sent over the HTTP API.
///
/// [`D1Api::query_database`] reports every failure through this value instead of `Err`.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    Success(ApiQueryResponse),
    Failure(String),
}

/// Authenticated client for the D1 endpoints of the Cloudflare API.
///
/// The bearer token and JSON content type are attached to every request for the lifetime of
/// the client.
#[derive(Debug, Clone)]
pub struct D1Api {
    client: reqwest::Client,
    account_id: String,
    base_url: String,
    page_size: usize,
}

impl D1Api {
    /// Build a client for the account in `config`.
    ///
    /// # Errors
    /// Returns `D1MiddlewareError::ConfigError` for an empty or non-header-safe token, an empty
    /// account id, or a zero page size; `HttpError` if the HTTP client cannot be built.
    pub fn new(config: &D1ApiConfig) -> Result<Self, D1MiddlewareError> {
        config.validate()?;

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.api_token))
            .map_err(|e| D1MiddlewareError::ConfigError(format!("invalid API token: {e}")))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(format!("d1-middleware/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            account_id: config.account_id.clone(),
            base_url: config.base_url.clone(),
            page_size: config.page_size,
        })
    }

    fn databases_url(&self) -> String {
        format!("{}/accounts/{}/d1/database", self.base_url, self.account_id)
    }

    /// List every database in the account, following pagination.
    ///
    /// # Errors
    /// Returns `HttpError` on transport failure, `ApiError` on a non-success status, and
    /// `SerializationError` if a page cannot be decoded.
    pub async fn list_databases(&self) -> Result<Vec<DatabaseRecord>, D1MiddlewareError> {
        let per_page = self.page_size;
        let mut databases: Vec<DatabaseRecord> = Vec::new();
        let mut page = 1_usize;

        // Both checks are kept: an exact multiple means another page may exist, a short page
        // means this was the last one.
        while databases.len() % per_page == 0 {
            debug!(page, per_page, "listing D1 databases");
            let response = self
                .client
                .get(self.databases_url())
                .query(&[("per_page", per_page), ("page", page)])
                .send()
                .await?;

            let status = response.status();
            let body = response.text().await?;
            if !status.is_success() {
                let message = error_message(&body, status);
                warn!(%status, error = %message, "listing D1 databases failed");
                return Err(D1MiddlewareError::ApiError(message));
            }

            let listing: ListDatabasesResponse = serde_json::from_str(&body)?;
            let fetched = listing.result.len();
            databases.extend(listing.result);
            page += 1;
            if fetched < per_page {
                break;
            }
        }

        Ok(databases)
    }

    /// Find the first database named `name`, or `None` when the account has none.
    ///
    /// # Errors
    /// Propagates failures from [`list_databases`](Self::list_databases).
    pub async fn database_from_name(
        &self,
        name: &str,
    ) -> Result<Option<DatabaseRecord>, D1MiddlewareError> {
        let databases = self.list_databases().await?;
        Ok(databases.into_iter().find(|db| db.name == name))
    }

    /// Run one statement against the database with id `database_id`.
    pub async fn query_database(
        &self,
        database_id: &str,
        sql: &str,
        params: &[RowValues],
    ) -> QueryOutcome {
        let params = match Params::convert_sql_params(params) {
            Ok(params) => params.0,
            Err(e) => return QueryOutcome::Failure(e.to_string()),
        };
        let url = format!("{}/{}/query", self.databases_url(), database_id);

        let response = match self
            .client
            .post(url)
            .json(&QueryRequest { sql, params })
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "D1 API request failed");
                return QueryOutcome::Failure(e.to_string());
            }
        };

        let status = response.status();
        if status.is_success() {
            return match response.json::<ApiQueryResponse>().await {
                Ok(data) => QueryOutcome::Success(data),
                Err(e) => QueryOutcome::Failure(e.to_string()),
            };
        }

        let message = match response.text().await {
            Ok(body) => error_message(&body, status),
            Err(_) => status_text(status),
        };
        warn!(%status, error = %message, "D1 API rejected statement");
        QueryOutcome::Failure(message)
    }
}

/// First structured error message in an API error body, else the status text.
fn error_message(body: &str, status: StatusCode) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.errors.into_iter().next())
        .map_or_else(|| status_text(status), |first| first.message)
}

fn status_text(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map_or_else(|| status.as_str().to_string(), str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_prefers_first_structured_error() {
        let body = r#"{"errors":[{"code":7500,"message":"no such table: kv"},{"code":1,"message":"second"}]}"#;
        assert_eq!(
            error_message(body, StatusCode::BAD_REQUEST),
            "no such table: kv"
        );
    }

    #[test]
    fn error_message_falls_back_to_status_text() {
        assert_eq!(
            error_message("<html>oops</html>", StatusCode::BAD_GATEWAY),
            "Bad Gateway"
        );
        assert_eq!(
            error_message(r#"{"errors":[]}"#, StatusCode::UNAUTHORIZED),
            "Unauthorized"
        );
    }
}
