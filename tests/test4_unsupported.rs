#![cfg(feature = "sqlite")]

use std::sync::atomic::{AtomicBool, Ordering};

use d1_middleware::prelude::*;

const TRANSACTIONS: &str = "Transactions are not supported yet.";
const STREAMING: &str = "D1 Driver does not support streaming";

fn assert_unsupported(err: D1MiddlewareError, expected: &str) {
    match err {
        D1MiddlewareError::Unsupported(message) => assert_eq!(message, expected),
        other => panic!("expected Unsupported, got {other:?}"),
    }
}

#[tokio::test]
async fn driver_rejects_transactions() -> Result<(), Box<dyn std::error::Error>> {
    let db = Db::new(D1Dialect::new(LocalD1Binding::open_in_memory()?)).await?;
    let driver = db.driver();
    let conn = driver.acquire_connection().await?;

    assert_unsupported(
        driver.begin_transaction(&conn).await.expect_err("begin"),
        TRANSACTIONS,
    );
    assert_unsupported(
        driver.commit_transaction(&conn).await.expect_err("commit"),
        TRANSACTIONS,
    );
    assert_unsupported(
        driver.rollback_transaction(&conn).await.expect_err("rollback"),
        TRANSACTIONS,
    );

    // The connection is still usable afterwards.
    let one = conn.execute_query(&CompiledQuery::raw("SELECT 1 AS one")).await?;
    assert_eq!(one.rows[0]["one"], serde_json::json!(1));

    driver.release_connection(conn).await?;
    Ok(())
}

#[tokio::test]
async fn transaction_body_never_runs() -> Result<(), Box<dyn std::error::Error>> {
    let db = Db::new(D1Dialect::new(LocalD1Binding::open_in_memory()?)).await?;
    let ran = AtomicBool::new(false);

    let err = db
        .transaction(|conn| {
            ran.store(true, Ordering::SeqCst);
            Box::pin(async move { conn.execute_query(&CompiledQuery::raw("SELECT 1")).await })
        })
        .await
        .expect_err("transactions are rejected");

    assert_unsupported(err, TRANSACTIONS);
    assert!(!ran.load(Ordering::SeqCst));
    Ok(())
}

#[tokio::test]
async fn streaming_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let db = Db::new(D1Dialect::new(LocalD1Binding::open_in_memory()?)).await?;
    let query = CompiledQuery::raw("SELECT 1");

    let conn = db.driver().acquire_connection().await?;
    let Err(err) = conn.stream_query(&query, 10) else {
        panic!("streaming must be rejected");
    };
    assert_unsupported(err, STREAMING);
    db.driver().release_connection(conn).await?;

    let err = db
        .execute_streamed(&query, 10)
        .await
        .expect_err("streaming must be rejected");
    assert_unsupported(err, STREAMING);
    Ok(())
}

#[tokio::test]
async fn adapter_capabilities() -> Result<(), Box<dyn std::error::Error>> {
    let db = Db::new(D1Dialect::new(LocalD1Binding::open_in_memory()?)).await?;
    let adapter = db.adapter();
    assert!(!adapter.supports_transactional_ddl());
    assert!(adapter.supports_returning());
    assert!(adapter.supports_create_if_not_exists());

    // Migration locking is a no-op on D1.
    adapter.acquire_migration_lock().await?;
    adapter.release_migration_lock().await?;
    Ok(())
}
