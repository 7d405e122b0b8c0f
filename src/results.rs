use serde::de::DeserializeOwned;
use serde_json::{Map, Value as JsonValue};

use crate::error::D1MiddlewareError;

/// A single returned row, keyed by column name exactly as D1 reported it.
pub type Row = Map<String, JsonValue>;

/// The outcome of one executed statement.
///
/// `num_affected_rows` is absent, not zero, for statements that changed nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    /// Rows returned by the statement; empty when none were returned
    pub rows: Vec<Row>,
    /// Rowid of the last inserted row, when the transport reported one
    pub insert_id: Option<u64>,
    /// Number of rows changed, present only when greater than zero
    pub num_affected_rows: Option<u64>,
    /// Older name for `num_affected_rows`; always holds the same value.
    #[deprecated(note = "use `num_affected_rows`")]
    pub num_updated_or_deleted_rows: Option<u64>,
}

impl QueryResult {
    /// Build a result, keeping the deprecated alias in step with `num_affected_rows`.
    #[must_use]
    #[allow(deprecated)]
    pub fn new(rows: Vec<Row>, insert_id: Option<u64>, num_affected_rows: Option<u64>) -> Self {
        Self {
            rows,
            insert_id,
            num_affected_rows,
            num_updated_or_deleted_rows: num_affected_rows,
        }
    }

    /// Deserialize every row into `T`.
    ///
    /// # Errors
    /// Returns `D1MiddlewareError::SerializationError` if a row does not match `T`.
    pub fn rows_as<T: DeserializeOwned>(&self) -> Result<Vec<T>, D1MiddlewareError> {
        self.rows
            .iter()
            .map(|row| serde_json::from_value(JsonValue::Object(row.clone())).map_err(Into::into))
            .collect()
    }

    /// The first row, if any.
    #[must_use]
    pub fn first(&self) -> Option<&Row> {
        self.rows.first()
    }
}
