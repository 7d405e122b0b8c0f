use serde_json::Value as JsonValue;

use crate::error::D1MiddlewareError;
use crate::types::{ParamConverter, RowValues};

/// Positional parameters as the HTTP API's JSON `params` array.
pub struct Params(pub Vec<JsonValue>);

impl ParamConverter<'_> for Params {
    type Converted = Params;

    fn convert_sql_params(params: &[RowValues]) -> Result<Self::Converted, D1MiddlewareError> {
        Ok(Params(params.iter().map(RowValues::to_json).collect()))
    }
}
