use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use d1_middleware::prelude::*;
use serde_json::json;

/// Replays canned envelopes and records what it was asked to run.
#[derive(Default)]
struct ScriptedBinding {
    replies: Mutex<VecDeque<D1Result>>,
    seen: Mutex<Vec<D1PreparedStatement>>,
}

impl ScriptedBinding {
    fn with_replies(replies: Vec<D1Result>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            seen: Mutex::default(),
        }
    }

    fn seen(&self) -> Vec<D1PreparedStatement> {
        self.seen.lock().unwrap().clone()
    }

    fn next_reply(&self) -> D1Result {
        self.replies.lock().unwrap().pop_front().unwrap_or_default()
    }
}

#[async_trait]
impl D1Binding for ScriptedBinding {
    async fn all(&self, statement: &D1PreparedStatement) -> Result<D1Result, D1MiddlewareError> {
        self.seen.lock().unwrap().push(statement.clone());
        Ok(self.next_reply())
    }

    async fn batch(
        &self,
        statements: &[D1PreparedStatement],
    ) -> Result<Vec<D1Result>, D1MiddlewareError> {
        self.seen.lock().unwrap().extend_from_slice(statements);
        Ok(statements.iter().map(|_| self.next_reply()).collect())
    }
}

fn meta(changes: i64, last_row_id: Option<i64>) -> D1Meta {
    D1Meta {
        changes,
        last_row_id,
        ..D1Meta::default()
    }
}

#[tokio::test]
async fn insert_maps_changes_and_last_row_id() -> Result<(), Box<dyn std::error::Error>> {
    let binding = Arc::new(ScriptedBinding::with_replies(vec![D1Result::with_rows(
        Vec::new(),
        meta(1, Some(5)),
    )]));
    let db = Db::new(D1Dialect::from_shared(Arc::clone(&binding))).await?;

    let result = db
        .query("INSERT INTO kv (key, value) VALUES (?, ?)")
        .bind(vec!["a".into(), "1".into()])
        .execute()
        .await?;

    assert!(result.rows.is_empty());
    assert_eq!(result.num_affected_rows, Some(1));
    assert_eq!(result.insert_id, Some(5));

    let seen = binding.seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].sql(), "INSERT INTO kv (key, value) VALUES (?, ?)");
    assert_eq!(
        seen[0].params(),
        [RowValues::Text("a".into()), RowValues::Text("1".into())]
    );
    Ok(())
}

#[tokio::test]
async fn select_rows_pass_through_verbatim() -> Result<(), Box<dyn std::error::Error>> {
    let rows = vec![
        json!({"key": "a", "value": "1"}),
        json!({"key": "b", "value": null}),
    ]
    .into_iter()
    .filter_map(|row| row.as_object().cloned())
    .collect::<Vec<_>>();
    let binding = ScriptedBinding::with_replies(vec![D1Result::with_rows(
        rows.clone(),
        meta(0, None),
    )]);
    let db = Db::new(D1Dialect::new(binding)).await?;

    let result = db.query("SELECT key, value FROM kv").execute().await?;
    assert_eq!(result.rows, rows);
    assert_eq!(result.num_affected_rows, None);
    assert_eq!(result.insert_id, None);
    Ok(())
}

#[tokio::test]
async fn error_envelope_becomes_execution_error() -> Result<(), Box<dyn std::error::Error>> {
    let binding =
        ScriptedBinding::with_replies(vec![D1Result::failed("D1_ERROR: no such table: kv")]);
    let db = Db::new(D1Dialect::new(binding)).await?;

    let err = db
        .query("SELECT * FROM kv")
        .execute()
        .await
        .expect_err("error envelope must fail");
    match err {
        D1MiddlewareError::ExecutionError(message) => {
            assert_eq!(message, "D1_ERROR: no such table: kv");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn batch_fails_with_first_error_in_input_order() -> Result<(), Box<dyn std::error::Error>> {
    let binding = ScriptedBinding::with_replies(vec![
        D1Result::with_rows(Vec::new(), meta(1, Some(1))),
        D1Result::failed("second failed"),
        D1Result::failed("third failed"),
    ]);
    let queries = [
        CompiledQuery::raw("INSERT INTO kv VALUES ('a', '1')"),
        CompiledQuery::raw("INSERT INTO kv VALUES ('b', '2')"),
        CompiledQuery::raw("INSERT INTO kv VALUES ('c', '3')"),
    ];

    let err = batch(&binding, queries)
        .await
        .expect_err("batch with a failed statement must fail");
    match err {
        D1MiddlewareError::ExecutionError(message) => assert_eq!(message, "second failed"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(binding.seen().len(), 3);
    Ok(())
}

#[tokio::test]
async fn batch_maps_each_result() -> Result<(), Box<dyn std::error::Error>> {
    let binding = ScriptedBinding::with_replies(vec![
        D1Result::with_rows(Vec::new(), meta(2, Some(9))),
        D1Result::with_rows(
            vec![json!({"n": 2}).as_object().cloned().unwrap_or_default()],
            meta(0, None),
        ),
    ]);

    let [updated, counted] = batch(
        &binding,
        [
            CompiledQuery::raw("UPDATE kv SET value = 'x'"),
            CompiledQuery::raw("SELECT count(*) AS n FROM kv"),
        ],
    )
    .await?;

    assert_eq!(updated.num_affected_rows, Some(2));
    assert_eq!(updated.insert_id, Some(9));
    assert_eq!(counted.rows[0]["n"], json!(2));
    assert_eq!(counted.num_affected_rows, None);
    Ok(())
}

#[tokio::test]
async fn empty_batch_never_calls_the_binding() -> Result<(), Box<dyn std::error::Error>> {
    let binding = ScriptedBinding::default();
    let results = batch_all(&binding, &[]).await?;
    assert!(results.is_empty());
    assert!(binding.seen().is_empty());
    Ok(())
}
