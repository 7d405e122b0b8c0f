use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Key/value store on Cloudflare D1")]
pub(crate) struct Args {
    #[command(subcommand)]
    pub(crate) command: Command,
    /// SQLite file used as a local D1 database.
    #[arg(long, global = true, default_value = "kv.sqlite3", conflicts_with = "api")]
    pub(crate) local: PathBuf,
    /// Use the Cloudflare HTTP API instead of a local database.
    #[arg(long, global = true)]
    pub(crate) api: bool,
    #[arg(long, global = true, env = "CLOUDFLARE_API_TOKEN", hide_env_values = true)]
    pub(crate) api_token: Option<String>,
    #[arg(long, global = true, env = "CLOUDFLARE_ACCOUNT_ID")]
    pub(crate) account_id: Option<String>,
    #[arg(long, global = true, env = "D1_DATABASE_NAME")]
    pub(crate) database: Option<String>,
    /// Also write logs to this file.
    #[arg(long, global = true)]
    pub(crate) log: Option<PathBuf>,
    #[arg(long, short, global = true)]
    pub(crate) verbose: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub(crate) enum Command {
    /// Print the value stored under a key.
    Get {
        #[arg(long)]
        key: String,
    },
    /// Store a value, replacing any existing one.
    Set {
        #[arg(long)]
        key: String,
        #[arg(long)]
        value: String,
    },
    /// Remove a key.
    Delete {
        #[arg(long)]
        key: String,
    },
}
