// Collector - 結果収集（ファンイン）機能

use super::countdown::WorkerCountdown;
use crate::core::{JobResult, PoolSummary, ProgressReporter};
use chrono::Utc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

/// Collector: 全ワーカーの結果を集約して呼び出し側へ転送
///
/// 出力側は無制限バッファ。呼び出し側が読まなくてもワーカーは止まらない。
/// 出力ストリームは、全ワーカーの終了（カウント0）と内部チャンネルの
/// 枯渇を確認した後に1回だけ閉じる。
pub fn spawn_result_collector<O, R>(
    mut result_rx: mpsc::Receiver<JobResult<O>>,
    output_tx: mpsc::UnboundedSender<JobResult<O>>,
    countdown: WorkerCountdown,
    submitted: Arc<AtomicUsize>,
    reporter: Arc<R>,
    worker_count: usize,
) -> tokio::task::JoinHandle<PoolSummary>
where
    O: Send + 'static,
    R: ProgressReporter + 'static,
{
    tokio::spawn(async move {
        let start_time = Instant::now();
        let mut summary = PoolSummary::new(Utc::now());

        reporter.report_started(worker_count).await;

        while let Some(result) = result_rx.recv().await {
            summary.record(result.outcome.as_ref().map(|_| ()));

            if let Err(error) = &result.outcome {
                reporter
                    .report_failure(result.job_id, result.worker_id, error)
                    .await;
            }
            reporter
                .report_progress(summary.completed, submitted.load(Ordering::Acquire))
                .await;

            if output_tx.send(result).is_err() {
                // ストリームが破棄されていても集計は継続する
                tracing::trace!("result stream dropped by caller");
            }
        }

        // チャンネル終了 = 全送信側の破棄。カウントでも終了を確認する
        countdown.wait_zero().await;

        summary.submitted = submitted.load(Ordering::Acquire);
        summary.dropped = summary.submitted.saturating_sub(summary.completed);
        summary.elapsed = start_time.elapsed();

        // 出力ストリームを閉じる
        drop(output_tx);

        reporter.report_completed(&summary).await;
        tracing::debug!(
            completed = summary.completed,
            dropped = summary.dropped,
            "result collector finished"
        );

        summary
    })
}
