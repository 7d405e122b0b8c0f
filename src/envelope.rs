//! The per-statement result envelope both D1 transports return.

use serde::{Deserialize, Serialize};

use crate::results::Row;

/// Result of one statement as reported by D1.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct D1Result {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub results: Option<Vec<Row>>,
    #[serde(default)]
    pub meta: D1Meta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn default_success() -> bool {
    true
}

/// Execution metadata attached to a [`D1Result`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct D1Meta {
    #[serde(default)]
    pub changes: i64,
    #[serde(default)]
    pub last_row_id: Option<i64>,
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub rows_read: u64,
    #[serde(default)]
    pub rows_written: u64,
    #[serde(default)]
    pub changed_db: bool,
    #[serde(default)]
    pub size_after: u64,
}

impl D1Result {
    /// A successful envelope carrying `rows`.
    #[must_use]
    pub fn with_rows(rows: Vec<Row>, meta: D1Meta) -> Self {
        Self {
            success: true,
            results: Some(rows),
            meta,
            error: None,
        }
    }

    /// A failed envelope carrying the engine's message.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            results: None,
            meta: D1Meta::default(),
            error: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_api_statement_result() {
        let raw = r#"{
            "results": [{"key": "a", "value": "1"}],
            "success": true,
            "meta": {
                "changed_db": false,
                "changes": 0,
                "duration": 0.17,
                "last_row_id": 0,
                "rows_read": 1,
                "rows_written": 0,
                "size_after": 16384
            }
        }"#;
        let result: D1Result = serde_json::from_str(raw).unwrap();
        assert!(result.success);
        assert_eq!(result.results.as_ref().map(Vec::len), Some(1));
        assert_eq!(result.meta.last_row_id, Some(0));
        assert_eq!(result.meta.rows_read, 1);
        assert!(result.error.is_none());
    }

    #[test]
    fn missing_fields_default() {
        let result: D1Result = serde_json::from_str(r#"{"meta": {"last_row_id": null}}"#).unwrap();
        assert!(result.success);
        assert!(result.results.is_none());
        assert_eq!(result.meta.changes, 0);
        assert_eq!(result.meta.last_row_id, None);
    }
}
