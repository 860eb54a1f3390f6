// ワーカープールのトレイト定義
// 作業関数と進捗報告の抽象化インターフェース

use super::types::{Job, JobError, JobId, PoolSummary, WorkerId};
use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use tokio_util::sync::CancellationToken;

/// 作業関数の抽象化トレイト
///
/// プールはジョブの中身を解釈しない。HTTP呼び出しでも画像処理でも、
/// `handle`が値かエラーを返せばよい。
///
/// `cancel`はプールのキャンセル信号の子トークン。長時間の処理は
/// これを監視して早期に抜けることができる（協調的キャンセル）。
#[automock(type Input = u64; type Output = u64;)]
#[async_trait]
pub trait JobHandler: Send + Sync {
    type Input: Send + 'static;
    type Output: Send + 'static;

    async fn handle(
        &self,
        job: Job<Self::Input>,
        cancel: CancellationToken,
    ) -> Result<Self::Output>;
}

/// 進捗報告の抽象化トレイト
#[automock]
#[async_trait]
pub trait ProgressReporter: Send + Sync {
    /// ワーカー起動時の報告
    async fn report_started(&self, worker_count: usize);

    /// ジョブ失敗時の報告
    async fn report_failure(&self, job_id: JobId, worker_id: WorkerId, error: &JobError);

    /// 進捗更新の報告
    async fn report_progress(&self, completed: usize, submitted: usize);

    /// 全ワーカー終了時の報告
    async fn report_completed(&self, summary: &PoolSummary);
}

// ProgressReporter for Box<dyn ProgressReporter>
#[async_trait]
impl ProgressReporter for Box<dyn ProgressReporter> {
    async fn report_started(&self, worker_count: usize) {
        self.as_ref().report_started(worker_count).await
    }

    async fn report_failure(&self, job_id: JobId, worker_id: WorkerId, error: &JobError) {
        self.as_ref().report_failure(job_id, worker_id, error).await
    }

    async fn report_progress(&self, completed: usize, submitted: usize) {
        self.as_ref().report_progress(completed, submitted).await
    }

    async fn report_completed(&self, summary: &PoolSummary) {
        self.as_ref().report_completed(summary).await
    }
}
