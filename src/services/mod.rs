// サービス層 - 機能別のロジック
// 各サービスは特定の責任を持ち、疎結合で設計されている

pub mod collection;
pub mod config;
pub mod monitoring;
pub mod processing;

// 公開API - 各サービスの主要機能を明示的にエクスポート
pub use collection::{spawn_result_collector, ResultStream, WorkerCountdown};
pub use config::PoolConfig;
pub use monitoring::{LogProgressReporter, NoOpProgressReporter};
pub use processing::{execute_job, handler_fn, FnHandler};
