use std::sync::Arc;

use crate::adapter::{DialectAdapter, SqliteAdapter};
use crate::binding::{BindingTransport, D1Binding};
use crate::compiler::{QueryCompiler, SqliteQueryCompiler};
use crate::driver::{D1Driver, Driver};
use crate::introspect::{D1Introspector, DatabaseIntrospector};

#[cfg(feature = "api")]
use crate::api::{ApiTransport, D1Api, D1ApiConfig};
#[cfg(feature = "api")]
use crate::error::D1MiddlewareError;
#[cfg(feature = "api")]
use crate::introspect::SqliteIntrospector;

/// Everything a host needs to talk to one engine over one transport.
pub trait Dialect: Send + Sync {
    type Driver: Driver;
    type Compiler: QueryCompiler;
    type Adapter: DialectAdapter;
    type Introspector: DatabaseIntrospector;

    fn create_adapter(&self) -> Self::Adapter;

    fn create_driver(&self) -> Self::Driver;

    fn create_query_compiler(&self) -> Self::Compiler;

    fn create_introspector(&self) -> Self::Introspector;
}

/// D1 through the runtime's native binding.
///
/// ```rust,no_run
/// use d1_middleware::prelude::*;
///
/// # async fn demo() -> Result<(), D1MiddlewareError> {
/// let db = Db::new(D1Dialect::new(LocalD1Binding::open_in_memory()?)).await?;
/// db.query("CREATE TABLE kv (key TEXT PRIMARY KEY, value TEXT)").execute().await?;
/// # Ok(()) }
/// ```
pub struct D1Dialect<B> {
    binding: Arc<B>,
}

impl<B: D1Binding> D1Dialect<B> {
    pub fn new(binding: B) -> Self {
        Self {
            binding: Arc::new(binding),
        }
    }

    /// Use a binding that is shared with other code, e.g. the batch helper.
    pub fn from_shared(binding: Arc<B>) -> Self {
        Self { binding }
    }

    #[must_use]
    pub fn binding(&self) -> &Arc<B> {
        &self.binding
    }
}

impl<B> std::fmt::Debug for D1Dialect<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("D1Dialect").finish_non_exhaustive()
    }
}

impl<B: D1Binding + 'static> Dialect for D1Dialect<B> {
    type Driver = D1Driver<BindingTransport<B>>;
    type Compiler = SqliteQueryCompiler;
    type Adapter = SqliteAdapter;
    type Introspector = D1Introspector;

    fn create_adapter(&self) -> Self::Adapter {
        SqliteAdapter
    }

    fn create_driver(&self) -> Self::Driver {
        D1Driver::new(Arc::new(BindingTransport::new(Arc::clone(&self.binding))))
    }

    fn create_query_compiler(&self) -> Self::Compiler {
        SqliteQueryCompiler::new()
    }

    fn create_introspector(&self) -> Self::Introspector {
        D1Introspector::new()
    }
}

/// D1 through the Cloudflare HTTP API.
///
/// The HTTP API is not a stable interface for application traffic; expect it to change.
#[cfg(feature = "api")]
#[derive(Debug)]
pub struct D1ApiDialect {
    config: Arc<D1ApiConfig>,
    client: Arc<D1Api>,
}

#[cfg(feature = "api")]
impl D1ApiDialect {
    /// Build the dialect and its HTTP client.
    ///
    /// # Errors
    /// Returns an error if `config` is invalid or the HTTP client cannot be built.
    pub fn new(config: D1ApiConfig) -> Result<Self, D1MiddlewareError> {
        let client = D1Api::new(&config)?;
        Ok(Self {
            config: Arc::new(config),
            client: Arc::new(client),
        })
    }

    #[must_use]
    pub fn config(&self) -> &D1ApiConfig {
        &self.config
    }

    /// The underlying API client, for account-level calls such as listing databases.
    #[must_use]
    pub fn client(&self) -> &D1Api {
        &self.client
    }
}

#[cfg(feature = "api")]
impl Dialect for D1ApiDialect {
    type Driver = D1Driver<ApiTransport>;
    type Compiler = SqliteQueryCompiler;
    type Adapter = SqliteAdapter;
    type Introspector = SqliteIntrospector;

    fn create_adapter(&self) -> Self::Adapter {
        SqliteAdapter
    }

    fn create_driver(&self) -> Self::Driver {
        D1Driver::new(Arc::new(ApiTransport::new(
            Arc::clone(&self.client),
            self.config.database_name.clone(),
        )))
    }

    fn create_query_compiler(&self) -> Self::Compiler {
        SqliteQueryCompiler::new()
    }

    fn create_introspector(&self) -> Self::Introspector {
        SqliteIntrospector::new()
    }
}
