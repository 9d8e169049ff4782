//! Valentine CLI
//!
//! Command-line interface for reading and writing the Valentine book.

mod commands;
mod config;
mod types;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "valentine")]
#[command(about = "A hundred pages of love notes, shared between two", long_about = None)]
struct Cli {
    /// Directory holding local storage
    #[arg(long, global = true, env = "VALENTINE_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Cloud database URL (defaults to the compiled-in database)
    #[arg(long, global = true, env = "VALENTINE_DATABASE_URL")]
    database_url: Option<String>,

    /// Cloud database auth token
    #[arg(long, global = true, env = "VALENTINE_AUTH_TOKEN", hide_env_values = true)]
    auth_token: Option<String>,

    /// Use local storage only
    #[arg(long, global = true)]
    offline: bool,

    /// Log sync activity to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "valentine=info"
    } else {
        "valentine=warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config {
        data_dir: cli.data_dir,
        database_url: cli.database_url,
        auth_token: cli.auth_token,
        offline: cli.offline,
    };

    handle_command(cli.command, &config).await
}
