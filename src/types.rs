use chrono::NaiveDateTime;
use serde_json::Value as JsonValue;

use crate::error::D1MiddlewareError;

/// Timestamps are bound as TEXT in this format, which sorts chronologically.
pub(crate) const TIMESTAMP_FORMAT: &str = "%F %T%.f";

/// Values that can be bound as query parameters.
///
/// The same enum feeds both transports so callers never branch on the target:
/// ```rust
/// use d1_middleware::prelude::*;
///
/// let params = vec![
///     RowValues::Int(1),
///     RowValues::Text("alice".into()),
///     RowValues::Bool(true),
/// ];
/// # let _ = params;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum RowValues {
    /// Integer value (64-bit)
    Int(i64),
    /// Floating point value (64-bit)
    Float(f64),
    /// Text/string value
    Text(String),
    /// Boolean value, bound as 0/1
    Bool(bool),
    /// Timestamp value, bound as text
    Timestamp(NaiveDateTime),
    /// NULL value
    Null,
    /// JSON value, bound as its serialized text
    JSON(JsonValue),
    /// Binary data
    Blob(Vec<u8>),
}

impl RowValues {
    /// Check if this value is NULL
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_int(&self) -> Option<&i64> {
        if let RowValues::Int(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let RowValues::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }

    /// JSON form used in the HTTP API's `params` array.
    ///
    /// Non-finite floats have no JSON representation and are sent as `null`.
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        match self {
            RowValues::Int(i) => JsonValue::from(*i),
            RowValues::Float(f) => serde_json::Number::from_f64(*f)
                .map_or(JsonValue::Null, JsonValue::Number),
            RowValues::Text(s) => JsonValue::String(s.clone()),
            RowValues::Bool(b) => JsonValue::from(i64::from(*b)),
            RowValues::Timestamp(dt) => JsonValue::String(dt.format(TIMESTAMP_FORMAT).to_string()),
            RowValues::Null => JsonValue::Null,
            RowValues::JSON(j) => JsonValue::String(j.to_string()),
            RowValues::Blob(bytes) => {
                JsonValue::Array(bytes.iter().map(|b| JsonValue::from(*b)).collect())
            }
        }
    }
}

impl From<i64> for RowValues {
    fn from(value: i64) -> Self {
        RowValues::Int(value)
    }
}

impl From<f64> for RowValues {
    fn from(value: f64) -> Self {
        RowValues::Float(value)
    }
}

impl From<bool> for RowValues {
    fn from(value: bool) -> Self {
        RowValues::Bool(value)
    }
}

impl From<&str> for RowValues {
    fn from(value: &str) -> Self {
        RowValues::Text(value.to_string())
    }
}

impl From<String> for RowValues {
    fn from(value: String) -> Self {
        RowValues::Text(value)
    }
}

impl<T: Into<RowValues>> From<Option<T>> for RowValues {
    fn from(value: Option<T>) -> Self {
        value.map_or(RowValues::Null, Into::into)
    }
}

/// Convert a slice of `RowValues` into a transport's parameter type.
pub trait ParamConverter<'a> {
    type Converted;

    /// Convert a slice of `RowValues` into the transport's parameter type.
    ///
    /// # Errors
    ///
    /// Returns `D1MiddlewareError` if the conversion fails for any parameter.
    fn convert_sql_params(params: &'a [RowValues]) -> Result<Self::Converted, D1MiddlewareError>;
}
