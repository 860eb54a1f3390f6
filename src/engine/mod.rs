// エンジン層 - 並列処理とオーケストレーション
// サービス層を組み合わせてワーカープールを提供

pub mod api;
pub mod pool;
pub mod queue;
mod state;
pub mod worker;

// 公開API - 主要エンジンクラス
pub use api::{create_pool, create_pool_with_reporter, run_to_completion};
pub use pool::WorkerPool;
pub use queue::{Envelope, JobQueue, JobReceiver};
