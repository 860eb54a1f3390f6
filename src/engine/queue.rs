// JobQueue - 投入側とワーカー間の有界受け渡しキュー

use crate::core::{Job, JobId, PoolError, PoolResult};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

/// キュー内のジョブと、同期受け渡し時の受領通知
#[derive(Debug)]
pub struct Envelope<I> {
    job: Job<I>,
    handoff: Option<Handoff>,
}

/// 同期受け渡しの受領通知。受領した時点で受付数に加算する
#[derive(Debug)]
struct Handoff {
    ack: oneshot::Sender<()>,
    accepted: Arc<AtomicUsize>,
}

impl<I> Envelope<I> {
    pub fn job_id(&self) -> JobId {
        self.job.id
    }

    /// ワーカーが実行を確定したときに呼ぶ。投入側の待機を解除する
    ///
    /// 投入側が受け渡しを取り下げていた場合は`None`。このジョブは実行しない。
    pub fn claim(self) -> Option<Job<I>> {
        let Some(Handoff { ack, accepted }) = self.handoff else {
            return Some(self.job);
        };

        // 投入側が成功を観測する前に数える
        accepted.fetch_add(1, Ordering::AcqRel);
        if ack.send(()).is_err() {
            accepted.fetch_sub(1, Ordering::AcqRel);
            return None;
        }
        Some(self.job)
    }
}

/// 送信が確定するまで`pending`を仮加算しておく
///
/// 確定前にドロップされた場合（エラー、または投入Futureの破棄）は元に戻す。
struct PendingSlot<'a> {
    pending: &'a AtomicUsize,
    committed: bool,
}

impl<'a> PendingSlot<'a> {
    fn reserve(pending: &'a AtomicUsize) -> Self {
        pending.fetch_add(1, Ordering::AcqRel);
        Self {
            pending,
            committed: false,
        }
    }

    fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for PendingSlot<'_> {
    fn drop(&mut self) {
        if !self.committed {
            self.pending.fetch_sub(1, Ordering::AcqRel);
        }
    }
}

/// 有界FIFOキュー
///
/// `capacity > 0`: 満杯なら投入側が待機する（バックプレッシャー）。
/// `capacity = 0`: ワーカーが受け取るまで投入側が待機する。
///
/// 受付数はキューに入った時点（同期受け渡しではワーカーの受領時点）で
/// 加算する。途中で破棄された投入は数えない。
pub struct JobQueue<I> {
    sender: Mutex<Option<mpsc::Sender<Envelope<I>>>>,
    receiver: JobReceiver<I>,
    accepted: Arc<AtomicUsize>,
    capacity: usize,
    cancel: CancellationToken,
}

impl<I: Send + 'static> JobQueue<I> {
    pub fn new(capacity: usize, cancel: CancellationToken) -> Self {
        // tokioのチャンネルは容量0を扱えないため、同期受け渡しは容量1+受領通知で表現する
        let (tx, rx) = mpsc::channel(capacity.max(1));
        Self {
            sender: Mutex::new(Some(tx)),
            receiver: JobReceiver {
                inner: Arc::new(tokio::sync::Mutex::new(rx)),
                pending: Arc::new(AtomicUsize::new(0)),
            },
            accepted: Arc::new(AtomicUsize::new(0)),
            capacity,
            cancel,
        }
    }

    fn sender(&self) -> PoolResult<mpsc::Sender<Envelope<I>>> {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(PoolError::QueueClosed)
    }

    /// ジョブを投入
    ///
    /// キューが閉じていれば即座に`QueueClosed`。満杯で待機中に
    /// キャンセルされた場合も`QueueClosed`を返す。
    pub async fn submit(&self, job: Job<I>) -> PoolResult<()> {
        if self.cancel.is_cancelled() {
            return Err(PoolError::QueueClosed);
        }
        let sender = self.sender()?;

        let (envelope, ack) = self.wrap(job);

        // ワーカーが先に受信しても負にならないよう、送信前に仮加算する
        let slot = PendingSlot::reserve(&self.receiver.pending);
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(PoolError::QueueClosed),
            sent = sender.send(envelope) => sent.map_err(|_| PoolError::QueueClosed)?,
        }
        slot.commit();
        // close()がチャンネルを閉じられるよう、受領待ちの前に手放す
        drop(sender);

        let Some(mut ack) = ack else {
            self.accepted.fetch_add(1, Ordering::AcqRel);
            return Ok(());
        };

        // 受付数はワーカーがclaim()で加算する
        tokio::select! {
            biased;
            claimed = &mut ack => claimed.map_err(|_| PoolError::QueueClosed)?,
            _ = self.cancel.cancelled() => {
                // 受け渡しを取り下げる。既に受領済みなら成功扱い
                ack.close();
                ack.try_recv().map_err(|_| PoolError::QueueClosed)?;
            }
        }

        Ok(())
    }

    /// 待機せずに投入
    ///
    /// 同期受け渡しモードでは受け渡し枠が空いていれば受け付け、
    /// ワーカーの受領は待たない。
    pub fn try_submit(&self, job: Job<I>) -> PoolResult<()> {
        if self.cancel.is_cancelled() {
            return Err(PoolError::QueueClosed);
        }
        let sender = self.sender()?;

        let envelope = Envelope { job, handoff: None };
        let slot = PendingSlot::reserve(&self.receiver.pending);
        sender.try_send(envelope).map_err(|error| match error {
            mpsc::error::TrySendError::Full(_) => PoolError::QueueFull {
                capacity: self.capacity,
            },
            mpsc::error::TrySendError::Closed(_) => PoolError::QueueClosed,
        })?;
        slot.commit();

        self.accepted.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    fn wrap(&self, job: Job<I>) -> (Envelope<I>, Option<oneshot::Receiver<()>>) {
        if self.capacity == 0 {
            let (tx, rx) = oneshot::channel();
            let handoff = Handoff {
                ack: tx,
                accepted: Arc::clone(&self.accepted),
            };
            (
                Envelope {
                    job,
                    handoff: Some(handoff),
                },
                Some(rx),
            )
        } else {
            (Envelope { job, handoff: None }, None)
        }
    }

    /// 投入終了を通知（冪等）
    ///
    /// 戻り値は今回の呼び出しで閉じたかどうか。
    pub fn close(&self) -> bool {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .is_some()
    }

    pub fn is_closed(&self) -> bool {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// 未取得のジョブ数
    pub fn len(&self) -> usize {
        self.receiver.pending()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 受け付けたジョブの累計
    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::Acquire)
    }

    /// 集計用に受付数カウンターを共有する
    pub(crate) fn accepted_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.accepted)
    }

    /// ワーカー用の受信ハンドル
    pub fn receiver(&self) -> JobReceiver<I> {
        self.receiver.clone()
    }
}

/// ワーカー間で共有する受信側
///
/// 最初に準備のできたワーカーが次のジョブを取得する。
pub struct JobReceiver<I> {
    inner: Arc<tokio::sync::Mutex<mpsc::Receiver<Envelope<I>>>>,
    pending: Arc<AtomicUsize>,
}

impl<I> Clone for JobReceiver<I> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            pending: Arc::clone(&self.pending),
        }
    }
}

impl<I> JobReceiver<I> {
    /// 次のジョブを取得。キューが閉じられ空になったら`None`
    pub async fn next(&self) -> Option<Envelope<I>> {
        let envelope = self.inner.lock().await.recv().await?;
        self.pending.fetch_sub(1, Ordering::AcqRel);
        Some(envelope)
    }

    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    /// 未取得のジョブを全て破棄する（キャンセル後の後始末）
    pub async fn discard_pending(&self) -> usize {
        let mut rx = self.inner.lock().await;
        rx.close();

        let mut discarded = 0;
        while let Ok(envelope) = rx.try_recv() {
            tracing::trace!(job_id = %envelope.job_id(), "discarding unclaimed job");
            discarded += 1;
        }
        self.pending.fetch_sub(discarded, Ordering::AcqRel);
        discarded
    }
}
