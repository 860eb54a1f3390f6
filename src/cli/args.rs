use crate::services::config::PoolConfig;
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "worker_pool")]
#[command(about = "A bounded worker pool with cancellation and fan-in result collection")]
#[command(version)]
pub struct Cli {
    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info", env = "WORKER_POOL_LOG_LEVEL")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run synthetic jobs through the pool and print a summary
    Run(RunArgs),

    /// Print the effective pool configuration as JSON
    Config(ConfigArgs),
}

/// Pool settings shared by every subcommand
#[derive(Args, Debug, Clone, Default)]
pub struct PoolArgs {
    /// JSON configuration file (flags override its values)
    #[arg(short, long, env = "WORKER_POOL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Number of workers
    #[arg(short, long, env = "WORKER_POOL_WORKERS")]
    pub workers: Option<usize>,

    /// Queue capacity (0 = hand off directly to a worker)
    #[arg(short, long, env = "WORKER_POOL_QUEUE_CAPACITY")]
    pub queue_capacity: Option<usize>,

    /// Per-job timeout in milliseconds
    #[arg(short, long, env = "WORKER_POOL_TIMEOUT_MS")]
    pub timeout_ms: Option<u64>,

    /// Buffer size between workers and the result collector
    #[arg(long, env = "WORKER_POOL_RESULT_BUFFER")]
    pub result_buffer: Option<usize>,
}

impl PoolArgs {
    /// 設定ファイルとフラグから有効な設定を組み立てる
    pub fn resolve(&self) -> Result<PoolConfig> {
        let mut config = match &self.config {
            Some(path) => PoolConfig::from_json_file(path)?,
            None => PoolConfig::default(),
        };

        if let Some(workers) = self.workers {
            config = config.with_workers(workers);
        }
        if let Some(capacity) = self.queue_capacity {
            config = config.with_queue_capacity(capacity);
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config = config.with_job_timeout(Duration::from_millis(timeout_ms));
        }
        if let Some(buffer) = self.result_buffer {
            config = config.with_result_buffer(buffer);
        }

        config.validate().context("設定が不正です")?;
        Ok(config)
    }
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub pool: PoolArgs,

    /// Number of synthetic jobs to submit
    #[arg(short = 'n', long, default_value = "100")]
    pub jobs: u64,

    /// Simulated work duration per job in milliseconds
    #[arg(short, long, default_value = "10")]
    pub delay_ms: u64,

    /// Fail every Nth job (0 = never)
    #[arg(long, default_value = "0")]
    pub fail_every: u64,

    /// Panic while processing this payload
    #[arg(long)]
    pub panic_on: Option<u64>,

    /// Cancel the pool after this many milliseconds
    #[arg(long)]
    pub cancel_after_ms: Option<u64>,

    /// Print the summary as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    #[command(flatten)]
    pub pool: PoolArgs,
}
