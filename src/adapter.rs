use async_trait::async_trait;

use crate::error::D1MiddlewareError;

/// Engine capabilities a host consults before emitting SQL or running migrations.
#[async_trait]
pub trait DialectAdapter: Send + Sync {
    /// Whether DDL can be rolled back inside a transaction.
    fn supports_transactional_ddl(&self) -> bool;

    /// Whether `INSERT/UPDATE/DELETE ... RETURNING` is available.
    fn supports_returning(&self) -> bool;

    /// Whether `CREATE ... IF NOT EXISTS` is available.
    fn supports_create_if_not_exists(&self) -> bool {
        true
    }

    /// Take the migration lock before running migrations.
    ///
    /// # Errors
    /// Returns an error if the lock cannot be taken.
    async fn acquire_migration_lock(&self) -> Result<(), D1MiddlewareError>;

    /// Release the migration lock.
    ///
    /// # Errors
    /// Returns an error if the lock cannot be released.
    async fn release_migration_lock(&self) -> Result<(), D1MiddlewareError>;
}

/// SQLite capabilities, as exposed by D1.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteAdapter;

#[async_trait]
impl DialectAdapter for SqliteAdapter {
    // D1 has no cross-statement transactions, so there is nothing to roll DDL back with.
    fn supports_transactional_ddl(&self) -> bool {
        false
    }

    fn supports_returning(&self) -> bool {
        true
    }

    // A single writer serialises access on SQLite; no lock table is needed.
    async fn acquire_migration_lock(&self) -> Result<(), D1MiddlewareError> {
        Ok(())
    }

    async fn release_migration_lock(&self) -> Result<(), D1MiddlewareError> {
        Ok(())
    }
}
