use std::process::ExitCode;

use d1_middleware::prelude::*;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::args::Command;

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS kv (key TEXT PRIMARY KEY, value TEXT)";

#[derive(Debug, Deserialize)]
struct Entry {
    value: Option<String>,
}

/// How a command finished; `main` turns this into the process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    Done,
    KeyNotFound,
}

impl From<Outcome> for ExitCode {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Done => ExitCode::SUCCESS,
            Outcome::KeyNotFound => ExitCode::FAILURE,
        }
    }
}

pub(crate) async fn ensure_table<D: Dialect>(db: &Db<D>) -> Result<(), D1MiddlewareError> {
    db.query(CREATE_TABLE).execute().await?;
    debug!("kv table ready");
    Ok(())
}

pub(crate) async fn run<D: Dialect>(
    db: &Db<D>,
    command: Command,
) -> Result<Outcome, D1MiddlewareError> {
    match command {
        Command::Get { key } => {
            let entry: Option<Entry> = db
                .query("SELECT value FROM kv WHERE key = $1")
                .bind(vec![RowValues::from(key.as_str())])
                .fetch_optional()
                .await?;
            match entry {
                Some(entry) => {
                    println!("{}", json!({ "key": key, "value": entry.value }));
                    Ok(Outcome::Done)
                }
                None => {
                    warn!(%key, "key not found");
                    Ok(Outcome::KeyNotFound)
                }
            }
        }
        Command::Set { key, value } => {
            let result = db
                .query(
                    "INSERT INTO kv (key, value) VALUES ($1, $2) \
                     ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                )
                .bind(vec![key.as_str().into(), value.as_str().into()])
                .execute()
                .await?;
            info!(%key, changes = ?result.num_affected_rows, "stored");
            println!("{}", json!({ "key": key, "value": value }));
            Ok(Outcome::Done)
        }
        Command::Delete { key } => {
            let result = db
                .query("DELETE FROM kv WHERE key = $1")
                .bind(vec![key.as_str().into()])
                .execute()
                .await?;
            let deleted = result.num_affected_rows.unwrap_or(0);
            info!(%key, deleted, "deleted");
            println!("{}", json!({ "key": key, "deleted": deleted }));
            Ok(Outcome::Done)
        }
    }
}
