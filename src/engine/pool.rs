// WorkerPool - 有界ワーカープール
// キュー、ワーカー群、結果コレクターを組み合わせ、状態遷移を管理する

use super::queue::JobQueue;
use super::state::StateCell;
use super::worker::spawn_workers;
use crate::{
    core::{
        Job, JobHandler, JobId, JobResult, PoolError, PoolResult, PoolState, PoolSummary,
        ProgressReporter,
    },
    services::{
        collection::{spawn_result_collector, ResultStream, WorkerCountdown},
        config::PoolConfig,
        monitoring::NoOpProgressReporter,
    },
};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// 有界ワーカープール
///
/// 固定数のワーカーが共有キューからジョブを取り出し、`JobHandler`で処理する。
/// 結果は1本の`ResultStream`に集約され、全ワーカー終了後に閉じられる。
///
/// 状態遷移: `Created → Running → (Draining | Cancelling) → Stopped`
///
/// プールを破棄すると投入側が閉じられ、ワーカーは残りのジョブを処理して終了する。
pub struct WorkerPool<H: JobHandler, R = NoOpProgressReporter> {
    config: PoolConfig,
    handler: Arc<H>,
    reporter: Arc<R>,
    queue: JobQueue<H::Input>,
    cancel: CancellationToken,
    state: Arc<StateCell>,
    countdown: WorkerCountdown,
    next_id: AtomicU64,
    started: AtomicBool,
    results: Mutex<Option<ResultStream<H::Output>>>,
    output_tx: Mutex<Option<mpsc::UnboundedSender<JobResult<H::Output>>>>,
}

impl<H> WorkerPool<H, NoOpProgressReporter>
where
    H: JobHandler + 'static,
{
    /// 新しいプールを作成（`Created`状態）
    ///
    /// 設定が不正な場合は`Configuration`エラー。
    pub fn new(config: PoolConfig, handler: H) -> PoolResult<Self> {
        Self::with_reporter(config, handler, NoOpProgressReporter::new())
    }
}

impl<H, R> WorkerPool<H, R>
where
    H: JobHandler + 'static,
    R: ProgressReporter + 'static,
{
    /// 進捗レポーターを指定してプールを作成
    pub fn with_reporter(config: PoolConfig, handler: H, reporter: R) -> PoolResult<Self> {
        config.validate()?;

        let cancel = CancellationToken::new();
        let (output_tx, output_rx) = mpsc::unbounded_channel();

        Ok(Self {
            queue: JobQueue::new(config.queue_capacity(), cancel.clone()),
            countdown: WorkerCountdown::new(config.worker_count()),
            config,
            handler: Arc::new(handler),
            reporter: Arc::new(reporter),
            cancel,
            state: Arc::new(StateCell::new()),
            next_id: AtomicU64::new(1),
            started: AtomicBool::new(false),
            results: Mutex::new(Some(ResultStream::new(output_rx))),
            output_tx: Mutex::new(Some(output_tx)),
        })
    }

    /// ワーカーと結果コレクターを起動
    ///
    /// 起動できるのは1回のみ。`close()`や`cancel()`の後に起動した場合、
    /// ワーカーは残りのジョブを処理するか即座に終了する。
    pub fn start(&self) -> PoolResult<()> {
        if self.state.get().is_terminal() {
            return Err(PoolError::PoolStopped);
        }
        if self.started.swap(true, Ordering::AcqRel) {
            return Err(PoolError::AlreadyStarted);
        }

        let output_tx = self
            .output_tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or_else(|| PoolError::internal(anyhow::anyhow!("result sender missing")))?;

        // 停止処理より先に遷移しておく（Created → Stoppedは許可されない）
        self.state.transition(PoolState::Running);

        let worker_count = self.config.worker_count();
        let (result_tx, result_rx) = mpsc::channel(self.config.result_buffer());

        // result_txはワーカーへ複製され、ここで元が破棄される
        spawn_workers(
            Arc::clone(&self.handler),
            self.queue.receiver(),
            result_tx,
            &self.countdown,
            worker_count,
            self.config.job_timeout(),
            &self.cancel,
        );

        let collector = spawn_result_collector(
            result_rx,
            output_tx,
            self.countdown.clone(),
            self.queue.accepted_counter(),
            Arc::clone(&self.reporter),
            worker_count,
        );

        let state = Arc::clone(&self.state);
        let jobs = self.queue.receiver();
        tokio::spawn(async move {
            let summary = match collector.await {
                Ok(summary) => Some(summary),
                Err(error) => {
                    tracing::error!(%error, "result collector failed");
                    None
                }
            };

            let discarded = jobs.discard_pending().await;
            if discarded > 0 {
                tracing::debug!(discarded, "unclaimed jobs dropped");
            }

            state.finish(summary);
        });

        tracing::debug!(
            workers = worker_count,
            queue_capacity = self.config.queue_capacity(),
            "workers spawned"
        );
        Ok(())
    }

    /// ペイロードを投入し、採番したジョブIDを返す
    ///
    /// キューが満杯なら空きが出るまで待機する。容量0の場合は
    /// ワーカーが受け取るまで待機する。
    pub async fn submit(&self, payload: H::Input) -> PoolResult<JobId> {
        let job = Job::new(self.next_job_id(), payload);
        self.submit_job(job).await
    }

    /// ID指定済みのジョブを投入
    pub async fn submit_job(&self, job: Job<H::Input>) -> PoolResult<JobId> {
        self.ensure_not_stopped()?;

        // 受付数はキューが確定時に数える。途中で破棄されても残らない
        let job_id = job.id;
        self.queue.submit(job).await?;

        tracing::trace!(%job_id, "job submitted");
        Ok(job_id)
    }

    /// 待機せずに投入。満杯なら`QueueFull`
    pub fn try_submit(&self, payload: H::Input) -> PoolResult<JobId> {
        self.ensure_not_stopped()?;

        let job = Job::new(self.next_job_id(), payload);
        let job_id = job.id;
        self.queue.try_submit(job)?;
        Ok(job_id)
    }

    /// 投入終了を通知（冪等）。キュー内のジョブは全て処理される
    pub fn close(&self) {
        if self.state.get().is_terminal() {
            return;
        }
        // ワーカーが終了しうる前にDrainingへ遷移する（Running → Stoppedは許可されない）
        self.state.transition(PoolState::Draining);
        if self.queue.close() {
            tracing::debug!("job queue closed");
        }
    }

    /// キャンセル（冪等）
    ///
    /// 未取得のジョブは破棄され、実行中のジョブは完了するか
    /// 次のawait地点で中断される。
    pub fn cancel(&self) {
        if self.state.get().is_terminal() {
            return;
        }
        if !self.cancel.is_cancelled() {
            tracing::info!("worker pool cancelled");
        }
        self.state.transition(PoolState::Cancelling);
        self.cancel.cancel();
        self.queue.close();
    }

    /// 結果ストリームを取得（1回のみ）
    pub fn collect(&self) -> PoolResult<ResultStream<H::Output>> {
        self.results
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(PoolError::ResultsTaken)
    }

    /// `Stopped`になるまで待機し、集計を返す
    ///
    /// 結果ストリームを読まなくても完了する。
    pub async fn wait(&self) -> PoolResult<PoolSummary> {
        if !self.started.load(Ordering::Acquire) {
            return Err(PoolError::NotStarted);
        }
        self.state.wait_stopped().await
    }

    pub fn state(&self) -> PoolState {
        self.state.get()
    }

    /// 稼働中のワーカー数
    pub fn active_workers(&self) -> usize {
        if self.started.load(Ordering::Acquire) {
            self.countdown.remaining()
        } else {
            0
        }
    }

    /// 設定への参照を取得
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// 作業関数へ渡されるトークンの親
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// 受け付けたジョブの累計
    pub fn submitted_count(&self) -> usize {
        self.queue.accepted()
    }

    /// キュー内で未取得のジョブ数
    pub fn queued_jobs(&self) -> usize {
        self.queue.len()
    }

    fn next_job_id(&self) -> JobId {
        JobId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    fn ensure_not_stopped(&self) -> PoolResult<()> {
        if self.state.get().is_terminal() {
            Err(PoolError::PoolStopped)
        } else {
            Ok(())
        }
    }
}
