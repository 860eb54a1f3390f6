// 進捗監視の具象実装

use crate::core::{JobError, JobId, PoolSummary, ProgressReporter, WorkerId};
use async_trait::async_trait;

/// tracingによる進捗報告実装
#[derive(Debug, Clone)]
pub struct LogProgressReporter {
    quiet: bool,
    progress_interval: usize,
}

impl Default for LogProgressReporter {
    fn default() -> Self {
        Self {
            quiet: false,
            progress_interval: 100,
        }
    }
}

impl LogProgressReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn quiet() -> Self {
        Self {
            quiet: true,
            ..Self::default()
        }
    }

    /// 進捗をログ出力する間隔（完了件数）
    pub fn with_progress_interval(mut self, interval: usize) -> Self {
        self.progress_interval = interval.max(1);
        self
    }
}

#[async_trait]
impl ProgressReporter for LogProgressReporter {
    async fn report_started(&self, worker_count: usize) {
        if !self.quiet {
            tracing::info!(worker_count, "worker pool started");
        }
    }

    async fn report_failure(&self, job_id: JobId, worker_id: WorkerId, error: &JobError) {
        if !self.quiet {
            tracing::warn!(%job_id, worker_id, kind = %error.kind, "job failed: {}", error.message);
        }
    }

    async fn report_progress(&self, completed: usize, submitted: usize) {
        if !self.quiet && (completed % self.progress_interval == 0 || completed == submitted) {
            tracing::info!(completed, submitted, "progress");
        }
    }

    async fn report_completed(&self, summary: &PoolSummary) {
        if !self.quiet {
            tracing::info!(
                completed = summary.completed,
                succeeded = summary.succeeded,
                failed = summary.failed,
                dropped = summary.dropped,
                elapsed_ms = summary.elapsed.as_millis() as u64,
                "worker pool stopped"
            );
        }
    }
}

/// 何もしない進捗報告実装（テスト・ベンチマーク用）
#[derive(Debug, Default, Clone)]
pub struct NoOpProgressReporter;

impl NoOpProgressReporter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProgressReporter for NoOpProgressReporter {
    async fn report_started(&self, _worker_count: usize) {}

    async fn report_failure(&self, _job_id: JobId, _worker_id: WorkerId, _error: &JobError) {}

    async fn report_progress(&self, _completed: usize, _submitted: usize) {}

    async fn report_completed(&self, _summary: &PoolSummary) {}
}
