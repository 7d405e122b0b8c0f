#![cfg(feature = "sqlite")]

use d1_middleware::prelude::*;
use serde::Deserialize;
use tempfile::tempdir;

#[derive(Debug, Deserialize, PartialEq)]
struct Entry {
    key: String,
    value: Option<String>,
}

async fn kv_db() -> Result<Db<D1Dialect<LocalD1Binding>>, D1MiddlewareError> {
    let db = Db::new(D1Dialect::new(LocalD1Binding::open_in_memory()?)).await?;
    db.query("CREATE TABLE kv (key TEXT PRIMARY KEY, value TEXT)")
        .execute()
        .await?;
    Ok(db)
}

#[tokio::test]
async fn insert_select_upsert_delete() -> Result<(), Box<dyn std::error::Error>> {
    let db = kv_db().await?;

    let inserted = db
        .query("INSERT INTO kv (key, value) VALUES ($1, $2)")
        .bind(vec!["a".into(), "1".into()])
        .execute()
        .await?;
    assert!(inserted.rows.is_empty());
    assert_eq!(inserted.num_affected_rows, Some(1));
    assert_eq!(inserted.insert_id, Some(1));

    let entries: Vec<Entry> = db
        .query("SELECT key, value FROM kv WHERE key = $1")
        .bind(vec!["a".into()])
        .fetch_all()
        .await?;
    assert_eq!(
        entries,
        vec![Entry {
            key: "a".into(),
            value: Some("1".into()),
        }]
    );

    let upserted = db
        .query(
            "INSERT INTO kv (key, value) VALUES ($1, $2) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(vec!["a".into(), "2".into()])
        .execute()
        .await?;
    assert_eq!(upserted.num_affected_rows, Some(1));

    let entry: Option<Entry> = db
        .query("SELECT key, value FROM kv WHERE key = ?")
        .bind(vec!["a".into()])
        .fetch_optional()
        .await?;
    assert_eq!(entry.and_then(|e| e.value).as_deref(), Some("2"));

    let deleted = db
        .query("DELETE FROM kv WHERE key = $1")
        .bind(vec!["a".into()])
        .execute()
        .await?;
    assert_eq!(deleted.num_affected_rows, Some(1));

    let missing = db
        .query("DELETE FROM kv WHERE key = $1")
        .bind(vec!["a".into()])
        .execute()
        .await?;
    assert_eq!(missing.num_affected_rows, None);

    let gone: Option<Entry> = db
        .query("SELECT key, value FROM kv WHERE key = $1")
        .bind(vec!["a".into()])
        .fetch_optional()
        .await?;
    assert!(gone.is_none());

    db.destroy().await?;
    Ok(())
}

#[tokio::test]
async fn reads_report_no_changes_and_no_insert_id() -> Result<(), Box<dyn std::error::Error>> {
    let db = kv_db().await?;
    db.query("INSERT INTO kv (key, value) VALUES ('a', '1'), ('b', NULL)")
        .execute()
        .await?;

    let selected = db
        .query("SELECT key, value FROM kv ORDER BY key")
        .execute()
        .await?;
    assert_eq!(selected.num_affected_rows, None);
    assert_eq!(selected.insert_id, None);
    assert_eq!(selected.rows.len(), 2);
    assert_eq!(selected.rows[1]["value"], serde_json::Value::Null);
    Ok(())
}

#[tokio::test]
async fn binds_every_value_kind() -> Result<(), Box<dyn std::error::Error>> {
    let db = Db::new(D1Dialect::new(LocalD1Binding::open_in_memory()?)).await?;
    let result = db
        .query("SELECT $1 AS i, $2 AS f, $3 AS b, $4 AS n, $5 AS j, $6 AS blob")
        .bind(vec![
            RowValues::Int(7),
            RowValues::Float(1.5),
            RowValues::Bool(true),
            RowValues::Null,
            RowValues::JSON(serde_json::json!({"a": 1})),
            RowValues::Blob(vec![1, 2]),
        ])
        .execute()
        .await?;

    let row = result.first().ok_or("no row")?;
    assert_eq!(row["i"], serde_json::json!(7));
    assert_eq!(row["f"], serde_json::json!(1.5));
    assert_eq!(row["b"], serde_json::json!(1));
    assert_eq!(row["n"], serde_json::Value::Null);
    assert_eq!(row["j"], serde_json::json!(r#"{"a":1}"#));
    assert_eq!(row["blob"], serde_json::json!([1, 2]));
    Ok(())
}

#[tokio::test]
async fn translation_can_be_turned_off_per_query() -> Result<(), Box<dyn std::error::Error>> {
    let db = Db::new(D1Dialect::new(LocalD1Binding::open_in_memory()?)).await?;

    let translated = db
        .query("SELECT $1 AS v, '$2' AS literal")
        .bind(vec![RowValues::Int(3)])
        .compile();
    assert_eq!(translated.sql, "SELECT ?1 AS v, '$2' AS literal");

    let untouched = db
        .query("SELECT $1 AS v")
        .bind(vec![RowValues::Int(3)])
        .translation(TranslationMode::ForceOff)
        .compile();
    assert_eq!(untouched.sql, "SELECT $1 AS v");

    // SQLite also accepts `$name` parameters, bound positionally.
    let result = db
        .query("SELECT $1 AS v")
        .bind(vec![RowValues::Int(3)])
        .translation(TranslationMode::ForceOff)
        .execute()
        .await?;
    assert_eq!(result.rows[0]["v"], serde_json::json!(3));
    Ok(())
}

#[tokio::test]
async fn engine_errors_surface_as_execution_errors() -> Result<(), Box<dyn std::error::Error>> {
    let db = Db::new(D1Dialect::new(LocalD1Binding::open_in_memory()?)).await?;
    let err = db
        .query("SELECT * FROM missing_table")
        .execute()
        .await
        .expect_err("missing table must fail");
    match err {
        D1MiddlewareError::ExecutionError(message) => {
            assert!(message.contains("no such table"), "{message}");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    // The connection was released; the next statement still runs.
    let ok = db.query("SELECT 1 AS one").execute().await?;
    assert_eq!(ok.rows[0]["one"], serde_json::json!(1));
    Ok(())
}

#[tokio::test]
async fn file_database_persists_between_bindings() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let path = dir.path().join("kv.sqlite3");

    {
        let db = Db::new(D1Dialect::new(LocalD1Binding::open(&path)?)).await?;
        db.query("CREATE TABLE kv (key TEXT PRIMARY KEY, value TEXT)")
            .execute()
            .await?;
        db.query("INSERT INTO kv (key, value) VALUES ($1, $2)")
            .bind(vec!["k".into(), "v".into()])
            .execute()
            .await?;
        db.destroy().await?;
    }

    let db = Db::new(D1Dialect::new(LocalD1Binding::open(&path)?)).await?;
    let entries: Vec<Entry> = db.query("SELECT key, value FROM kv").fetch_all().await?;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].value.as_deref(), Some("v"));
    Ok(())
}

#[tokio::test]
async fn trigger_and_cascade_writes_are_not_counted() -> Result<(), Box<dyn std::error::Error>> {
    let db = kv_db().await?;
    for ddl in [
        "CREATE TABLE audit (note TEXT NOT NULL)",
        "CREATE TRIGGER kv_audit AFTER INSERT ON kv BEGIN \
         INSERT INTO audit (note) VALUES ('inserted'); \
         INSERT INTO audit (note) VALUES (NEW.key); \
         END",
        "CREATE TABLE parent (id INTEGER PRIMARY KEY)",
        "CREATE TABLE child (id INTEGER PRIMARY KEY, \
         parent_id INTEGER NOT NULL REFERENCES parent(id) ON DELETE CASCADE)",
    ] {
        db.query(ddl).execute().await?;
    }

    let inserted = db
        .query("INSERT INTO kv (key, value) VALUES (?1, ?2)")
        .bind(vec!["a".into(), "1".into()])
        .execute()
        .await?;
    assert_eq!(inserted.num_affected_rows, Some(1));

    let audited = db.query("SELECT count(*) AS n FROM audit").execute().await?;
    assert_eq!(audited.rows[0]["n"], serde_json::json!(2));

    db.query("INSERT INTO parent (id) VALUES (1)").execute().await?;
    let children = db
        .query("INSERT INTO child (parent_id) VALUES (1), (1), (1)")
        .execute()
        .await?;
    assert_eq!(children.num_affected_rows, Some(3));

    let deleted = db
        .query("DELETE FROM parent WHERE id = $1")
        .bind(vec![RowValues::Int(1)])
        .execute()
        .await?;
    assert_eq!(deleted.num_affected_rows, Some(1));

    let remaining = db.query("SELECT count(*) AS n FROM child").execute().await?;
    assert_eq!(remaining.rows[0]["n"], serde_json::json!(0));
    Ok(())
}

#[tokio::test]
async fn dollar_in_identifiers_survives_translation() -> Result<(), Box<dyn std::error::Error>> {
    let db = Db::new(D1Dialect::new(LocalD1Binding::open_in_memory()?)).await?;
    db.query("CREATE TABLE t (price$1 INTEGER)").execute().await?;
    db.query("INSERT INTO t (price$1) VALUES ($1)")
        .bind(vec![RowValues::Int(7)])
        .execute()
        .await?;

    let result = db
        .query("SELECT price$1 AS v FROM t WHERE price$1 = $1")
        .bind(vec![RowValues::Int(7)])
        .execute()
        .await?;
    assert_eq!(result.rows.len(), 1);
    assert_eq!(result.rows[0]["v"], serde_json::json!(7));
    Ok(())
}
