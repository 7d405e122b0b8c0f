use rusqlite::types::Value;
use serde_json::Value as JsonValue;

use crate::error::D1MiddlewareError;
use crate::types::{ParamConverter, RowValues, TIMESTAMP_FORMAT};

/// Convert a single `RowValues` to a rusqlite `Value`.
#[must_use]
pub fn row_value_to_sqlite_value(value: &RowValues) -> Value {
    match value {
        RowValues::Int(i) => Value::Integer(*i),
        RowValues::Float(f) => Value::Real(*f),
        RowValues::Text(s) => Value::Text(s.clone()),
        RowValues::Bool(b) => Value::Integer(i64::from(*b)),
        RowValues::Timestamp(dt) => Value::Text(dt.format(TIMESTAMP_FORMAT).to_string()),
        RowValues::Null => Value::Null,
        RowValues::JSON(jval) => Value::Text(jval.to_string()),
        RowValues::Blob(bytes) => Value::Blob(bytes.clone()),
    }
}

/// Convert a rusqlite column value into the JSON shape D1 returns rows in.
///
/// Blobs come back as arrays of byte values; non-finite reals have no JSON form and map to
/// `null`.
#[must_use]
pub fn sqlite_value_to_json(value: Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Integer(i) => JsonValue::from(i),
        Value::Real(f) => serde_json::Number::from_f64(f).map_or(JsonValue::Null, JsonValue::Number),
        Value::Text(s) => JsonValue::String(s),
        Value::Blob(b) => JsonValue::Array(b.into_iter().map(JsonValue::from).collect()),
    }
}

/// Positional rusqlite parameters.
pub struct Params(pub Vec<Value>);

impl Params {
    /// Build a borrowed params slice suitable for rusqlite execution.
    #[must_use]
    pub fn as_refs(&self) -> Vec<&dyn rusqlite::ToSql> {
        self.0.iter().map(|v| v as &dyn rusqlite::ToSql).collect()
    }
}

impl ParamConverter<'_> for Params {
    type Converted = Params;

    fn convert_sql_params(params: &[RowValues]) -> Result<Self::Converted, D1MiddlewareError> {
        Ok(Params(params.iter().map(row_value_to_sqlite_value).collect()))
    }
}
