use serde::{Deserialize, Serialize};

use crate::envelope::D1Result;

/// A database as listed by the HTTP API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseRecord {
    pub uuid: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_tables: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
}

/// An entry of the API's `errors` / `messages` arrays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiMessage {
    #[serde(default)]
    pub code: Option<i64>,
    pub message: String,
}

/// Reply to a statement POSTed to a database's `query` endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiQueryResponse {
    #[serde(default)]
    pub result: Vec<D1Result>,
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub errors: Vec<ApiMessage>,
    #[serde(default)]
    pub messages: Vec<ApiMessage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListDatabasesResponse {
    #[serde(default)]
    pub(crate) result: Vec<DatabaseRecord>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(default)]
    pub(crate) errors: Vec<ApiMessage>,
}

#[derive(Debug, Serialize)]
pub(crate) struct QueryRequest<'a> {
    pub(crate) sql: &'a str,
    pub(crate) params: Vec<serde_json::Value>,
}
