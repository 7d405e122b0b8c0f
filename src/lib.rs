//! Cloudflare D1 dialect for async Rust.
//!
//! Two transports are provided behind one driver/connection implementation:
//!
//! - [`D1Dialect`] talks to D1 through a native [`D1Binding`] (in a Worker, or the local
//!   `rusqlite`-backed [`LocalD1Binding`] for development and tests).
//! - [`D1ApiDialect`] talks to D1 through the Cloudflare HTTP API.
//!
//! Queries are compiled by [`SqliteQueryCompiler`] and run through [`Db`], which acquires and
//! releases a connection per statement. D1 has no interactive transactions or streaming
//! cursors; both are rejected with an error. Use [`batch`] for atomic multi-statement work.
//!
//! ```rust,no_run
//! use d1_middleware::prelude::*;
//!
//! # async fn demo() -> Result<(), D1MiddlewareError> {
//! let db = Db::new(D1Dialect::new(LocalD1Binding::open_in_memory()?)).await?;
//! db.query("CREATE TABLE kv (key TEXT PRIMARY KEY, value TEXT)")
//!     .execute()
//!     .await?;
//! # Ok(()) }
//! ```

pub mod adapter;
#[cfg(feature = "api")]
pub mod api;
pub mod batch;
pub mod binding;
pub mod compiler;
pub mod connection;
pub mod db;
pub mod dialect;
pub mod driver;
pub mod envelope;
pub mod error;
pub mod introspect;
pub mod prelude;
pub mod query;
pub mod results;
pub mod transform;
pub mod translation;
pub mod transport;
pub mod types;

pub use adapter::{DialectAdapter, SqliteAdapter};
#[cfg(feature = "api")]
pub use api::{ApiTransport, D1Api, D1ApiConfig, D1ApiConfigBuilder, QueryOutcome};
pub use batch::{batch, batch_all};
#[cfg(feature = "sqlite")]
pub use binding::LocalD1Binding;
pub use binding::{BindingTransport, D1Binding, D1PreparedStatement};
pub use compiler::{QueryCompiler, SqliteQueryCompiler};
pub use connection::D1Connection;
pub use db::{Db, QueryBuilder};
#[cfg(feature = "api")]
pub use dialect::D1ApiDialect;
pub use dialect::{D1Dialect, Dialect};
pub use driver::{D1Driver, DatabaseConnection, Driver, QueryStream};
pub use envelope::{D1Meta, D1Result};
pub use error::D1MiddlewareError;
pub use introspect::{D1Introspector, DatabaseIntrospector, DatabaseMetadataOptions};
pub use query::CompiledQuery;
pub use results::QueryResult;
pub use transform::build_query_result;
pub use translation::{QueryOptions, TranslationMode, translate_placeholders};
pub use types::{ParamConverter, RowValues};

/// Convert parameters into a backend-specific form.
///
/// # Errors
/// Returns an error if a value cannot be represented by the target backend.
pub fn convert_sql_params<'a, T: ParamConverter<'a>>(
    params: &'a [RowValues],
) -> Result<T::Converted, D1MiddlewareError> {
    T::convert_sql_params(params)
}
