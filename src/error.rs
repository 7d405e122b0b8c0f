use thiserror::Error;

#[derive(Debug, Error)]
pub enum D1MiddlewareError {
    #[cfg(feature = "api")]
    #[error(transparent)]
    HttpError(#[from] reqwest::Error),

    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    #[error(transparent)]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("D1 API error: {0}")]
    ApiError(String),

    #[error("{0}")]
    ExecutionError(String),

    #[error("{0}")]
    Unsupported(String),

    #[error("Other database error: {0}")]
    Other(String),
}

impl D1MiddlewareError {
    pub(crate) fn transactions_unsupported() -> Self {
        D1MiddlewareError::Unsupported("Transactions are not supported yet.".to_string())
    }

    pub(crate) fn streaming_unsupported() -> Self {
        D1MiddlewareError::Unsupported("D1 Driver does not support streaming".to_string())
    }
}
