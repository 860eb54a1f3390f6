// Worker - 単一ジョブ実行機能

use crate::core::{Job, JobError, JobHandler, JobResult, WorkerId};
use std::any::Any;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// 単一ジョブの実行
///
/// 作業関数は専用タスクで実行する。パニックはタスク境界で捕捉され
/// `Panicked`の結果になり、ワーカー自体は継続する。
///
/// タイムアウト時はタスクを`abort`する。中断は次のawait地点でのみ
/// 有効なので、ブロッキング処理はバックグラウンドで走り続ける。
pub async fn execute_job<H>(
    handler: Arc<H>,
    job: Job<H::Input>,
    worker_id: WorkerId,
    job_timeout: Option<Duration>,
    cancel: CancellationToken,
) -> JobResult<H::Output>
where
    H: JobHandler + 'static,
{
    let start_time = Instant::now();
    let job_id = job.id;

    let mut task = tokio::spawn(async move { handler.handle(job, cancel).await });

    let joined = match job_timeout {
        Some(limit) => match tokio::time::timeout(limit, &mut task).await {
            Ok(joined) => joined,
            Err(_) => {
                task.abort();
                tracing::debug!(%job_id, worker_id, "job timed out, task aborted");
                return JobResult {
                    job_id,
                    worker_id,
                    outcome: Err(JobError::timeout(limit)),
                    elapsed: start_time.elapsed(),
                };
            }
        },
        None => task.await,
    };

    let outcome = match joined {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(error)) => Err(JobError::failure(format!("{error:#}"))),
        Err(join_error) if join_error.is_panic() => {
            Err(JobError::panicked(panic_message(join_error.into_panic())))
        }
        Err(join_error) => Err(JobError::aborted(join_error.to_string())),
    };

    JobResult {
        job_id,
        worker_id,
        outcome,
        elapsed: start_time.elapsed(),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
