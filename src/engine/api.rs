// 高レベル公開API
// WorkerPoolを簡単に使用できるようにするための便利な関数

use super::WorkerPool;
use crate::{
    core::{JobHandler, JobResult, PoolResult, PoolSummary, ProgressReporter},
    services::{config::PoolConfig, monitoring::NoOpProgressReporter},
};

/// プールを作成して起動する
///
/// 返されたプールは`Running`状態で、すぐにジョブを投入できる。
pub fn create_pool<H>(config: PoolConfig, handler: H) -> PoolResult<WorkerPool<H>>
where
    H: JobHandler + 'static,
{
    create_pool_with_reporter(config, handler, NoOpProgressReporter::new())
}

/// レポーター付きでプールを作成して起動する
pub fn create_pool_with_reporter<H, R>(
    config: PoolConfig,
    handler: H,
    reporter: R,
) -> PoolResult<WorkerPool<H, R>>
where
    H: JobHandler + 'static,
    R: ProgressReporter + 'static,
{
    let pool = WorkerPool::with_reporter(config, handler, reporter)?;
    pool.start()?;
    Ok(pool)
}

/// 全ペイロードを処理し、結果と集計を返す
///
/// 投入、クローズ、全結果の収集までを1回の呼び出しで行う。
/// 結果の順序は保証されない。
pub async fn run_to_completion<H, I>(
    config: PoolConfig,
    handler: H,
    payloads: I,
) -> PoolResult<(Vec<JobResult<H::Output>>, PoolSummary)>
where
    H: JobHandler + 'static,
    I: IntoIterator<Item = H::Input>,
{
    let pool = create_pool(config, handler)?;
    let results = pool.collect()?;

    for payload in payloads {
        pool.submit(payload).await?;
    }
    pool.close();

    let results = results.drain().await;
    let summary = pool.wait().await?;
    Ok((results, summary))
}
