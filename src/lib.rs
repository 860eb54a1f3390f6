// 有界ワーカープール
// キャンセル対応の固定数ワーカーと、結果のファンイン収集を提供する

pub mod cli;
pub mod core;
pub mod engine;
pub mod services;

pub use crate::core::{
    Job, JobError, JobErrorKind, JobHandler, JobId, JobResult, PoolError, PoolResult, PoolState,
    PoolSummary, ProgressReporter, WorkerId,
};
pub use engine::{create_pool, create_pool_with_reporter, run_to_completion, WorkerPool};
pub use services::{
    handler_fn, FnHandler, LogProgressReporter, NoOpProgressReporter, PoolConfig, ResultStream,
};
