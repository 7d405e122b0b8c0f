use crate::error::D1MiddlewareError;

pub const DEFAULT_BASE_URL: &str = "https://api.cloudflare.com/client/v4";

/// Databases are listed this many at a time.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Options for reaching a D1 database over the HTTP API.
#[derive(Clone)]
pub struct D1ApiConfig {
    pub(crate) api_token: String,
    pub(crate) account_id: String,
    pub(crate) database_name: String,
    pub(crate) base_url: String,
    pub(crate) page_size: usize,
}

impl D1ApiConfig {
    #[must_use]
    pub fn new(
        api_token: impl Into<String>,
        account_id: impl Into<String>,
        database_name: impl Into<String>,
    ) -> Self {
        Self {
            api_token: api_token.into(),
            account_id: account_id.into(),
            database_name: database_name.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    #[must_use]
    pub fn builder(
        api_token: impl Into<String>,
        account_id: impl Into<String>,
        database_name: impl Into<String>,
    ) -> D1ApiConfigBuilder {
        D1ApiConfigBuilder::new(api_token, account_id, database_name)
    }

    #[must_use]
    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    #[must_use]
    pub fn database_name(&self) -> &str {
        &self.database_name
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub(crate) fn validate(&self) -> Result<(), D1MiddlewareError> {
        if self.api_token.is_empty() {
            return Err(D1MiddlewareError::ConfigError("API token is empty".into()));
        }
        if self.account_id.is_empty() {
            return Err(D1MiddlewareError::ConfigError("account id is empty".into()));
        }
        if self.page_size == 0 {
            return Err(D1MiddlewareError::ConfigError(
                "page size must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

// The token never appears in logs.
impl std::fmt::Debug for D1ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("D1ApiConfig")
            .field("api_token", &"<redacted>")
            .field("account_id", &self.account_id)
            .field("database_name", &self.database_name)
            .field("base_url", &self.base_url)
            .field("page_size", &self.page_size)
            .finish()
    }
}

/// Fluent builder for HTTP API options.
#[derive(Debug, Clone)]
pub struct D1ApiConfigBuilder {
    opts: D1ApiConfig,
}

impl D1ApiConfigBuilder {
    #[must_use]
    pub fn new(
        api_token: impl Into<String>,
        account_id: impl Into<String>,
        database_name: impl Into<String>,
    ) -> Self {
        Self {
            opts: D1ApiConfig::new(api_token, account_id, database_name),
        }
    }

    /// Point the client at a different API root, e.g. a local mock.
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.opts.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn page_size(mut self, page_size: usize) -> Self {
        self.opts.page_size = page_size;
        self
    }

    #[must_use]
    pub fn finish(self) -> D1ApiConfig {
        self.opts
    }
}
