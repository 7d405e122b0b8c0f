//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and functions
//! to make it easier to get started with the library.

pub use crate::adapter::{DialectAdapter, SqliteAdapter};
pub use crate::batch::{batch, batch_all};
pub use crate::binding::{D1Binding, D1PreparedStatement};
pub use crate::compiler::{QueryCompiler, SqliteQueryCompiler};
pub use crate::convert_sql_params;
pub use crate::db::{Db, QueryBuilder};
pub use crate::dialect::{D1Dialect, Dialect};
pub use crate::driver::{DatabaseConnection, Driver};
pub use crate::envelope::{D1Meta, D1Result};
pub use crate::error::D1MiddlewareError;
pub use crate::introspect::{
    DatabaseIntrospector, DatabaseMetadata, DatabaseMetadataOptions, TableMetadata,
};
pub use crate::query::CompiledQuery;
pub use crate::results::{QueryResult, Row};
pub use crate::translation::{QueryOptions, TranslationMode, translate_placeholders};
pub use crate::types::RowValues;

#[cfg(feature = "sqlite")]
pub use crate::binding::LocalD1Binding;

#[cfg(feature = "api")]
pub use crate::api::{D1Api, D1ApiConfig, QueryOutcome};
#[cfg(feature = "api")]
pub use crate::dialect::D1ApiDialect;
