use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use worker_pool::cli::{execute_config, execute_run, Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOGが設定されていれば優先、なければ--log-level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level.as_str()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(true)
        .init();

    match cli.command {
        Commands::Run(args) => execute_run(args).await,
        Commands::Config(args) => execute_config(args),
    }
}
