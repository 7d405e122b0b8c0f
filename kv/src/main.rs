mod args;
mod logging;
mod store;

use std::process::ExitCode;

use clap::Parser;
use d1_middleware::prelude::*;
use tracing::Level;

use crate::args::Args;
use crate::logging::LogWriter;

fn main() -> ExitCode {
    let args = Args::parse();
    let writer = LogWriter::new(args.log.clone()).unwrap_or_else(|err| {
        eprintln!("failed to open log file: {err}");
        std::process::exit(1);
    });

    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_target(false)
        .with_max_level(if args.verbose {
            Level::DEBUG
        } else {
            Level::INFO
        })
        .init();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(err) => {
            tracing::error!("failed to start runtime: {err}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(dispatch(args)) {
        Ok(code) => code,
        Err(err) => {
            tracing::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

async fn dispatch(args: Args) -> Result<ExitCode, D1MiddlewareError> {
    if args.api {
        return run_api(args).await;
    }
    run_local(args).await
}

#[cfg(feature = "sqlite")]
async fn run_local(args: Args) -> Result<ExitCode, D1MiddlewareError> {
    tracing::debug!(path = %args.local.display(), "opening local database");
    let db = Db::new(D1Dialect::new(LocalD1Binding::open(&args.local)?)).await?;
    store::ensure_table(&db).await?;
    let outcome = store::run(&db, args.command).await?;
    db.destroy().await?;
    Ok(outcome.into())
}

#[cfg(not(feature = "sqlite"))]
async fn run_local(_args: Args) -> Result<ExitCode, D1MiddlewareError> {
    Err(D1MiddlewareError::ConfigError(
        "built without the `sqlite` feature; pass --api".into(),
    ))
}

#[cfg(feature = "api")]
async fn run_api(args: Args) -> Result<ExitCode, D1MiddlewareError> {
    let config = D1ApiConfig::new(
        args.api_token.unwrap_or_default(),
        args.account_id.unwrap_or_default(),
        args.database.unwrap_or_default(),
    );
    let db = Db::new(D1ApiDialect::new(config)?).await?;
    let outcome = store::run(&db, args.command).await?;
    db.destroy().await?;
    Ok(outcome.into())
}

#[cfg(not(feature = "api"))]
async fn run_api(_args: Args) -> Result<ExitCode, D1MiddlewareError> {
    Err(D1MiddlewareError::ConfigError(
        "built without the `api` feature".into(),
    ))
}
