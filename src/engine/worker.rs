// Worker - 並列ワーカー機能

use super::queue::JobReceiver;
use crate::{
    core::{JobHandler, JobResult, WorkerId},
    services::{collection::WorkerCountdown, processing::execute_job},
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// 単一ワーカー
///
/// キューが閉じられ空になるか、キャンセルされるまでジョブを処理する。
/// 終了時はガードのドロップでカウントダウンを1減らす。
pub fn spawn_worker<H>(
    worker_id: WorkerId,
    handler: Arc<H>,
    jobs: JobReceiver<H::Input>,
    result_tx: mpsc::Sender<JobResult<H::Output>>,
    countdown: WorkerCountdown,
    job_timeout: Option<Duration>,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()>
where
    H: JobHandler + 'static,
{
    let guard = countdown.guard();

    tokio::spawn(async move {
        let _guard = guard;
        tracing::debug!(worker_id, "worker started");

        loop {
            // 次の作業を取得
            let envelope = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                next = jobs.next() => match next {
                    Some(envelope) => envelope,
                    None => break, // キュー終了
                },
            };

            // 受け取った直後にキャンセルされていれば実行しない
            if cancel.is_cancelled() {
                tracing::debug!(worker_id, job_id = %envelope.job_id(), "dropping job after cancellation");
                break;
            }

            let Some(job) = envelope.claim() else {
                // 投入側が取り下げ済み
                continue;
            };
            let result = execute_job(
                Arc::clone(&handler),
                job,
                worker_id,
                job_timeout,
                cancel.child_token(),
            )
            .await;

            // 結果送信
            if result_tx.send(result).await.is_err() {
                // 結果チャンネルが閉じられた場合は終了
                break;
            }
        }

        tracing::debug!(worker_id, "worker stopped");
    })
}

/// 固定数のワーカーを起動
pub fn spawn_workers<H>(
    handler: Arc<H>,
    jobs: JobReceiver<H::Input>,
    result_tx: mpsc::Sender<JobResult<H::Output>>,
    countdown: &WorkerCountdown,
    worker_count: usize,
    job_timeout: Option<Duration>,
    cancel: &CancellationToken,
) -> Vec<tokio::task::JoinHandle<()>>
where
    H: JobHandler + 'static,
{
    (0..worker_count)
        .map(|worker_id| {
            spawn_worker(
                worker_id,
                Arc::clone(&handler),
                jobs.clone(),
                result_tx.clone(),
                countdown.clone(),
                job_timeout,
                cancel.child_token(),
            )
        })
        .collect()
}
