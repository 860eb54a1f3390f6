// Countdown - 残りワーカー数の同期カウンター

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// 残りワーカー数のカウントダウンバリア
///
/// 各ワーカーは`guard()`を1つ保持し、終了時（パニック時を含む）に
/// 1回だけ減算される。1→0の遷移で待機者全員を起こす。
#[derive(Debug, Clone)]
pub struct WorkerCountdown {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    remaining: AtomicUsize,
    notify: Notify,
}

impl WorkerCountdown {
    pub fn new(count: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                remaining: AtomicUsize::new(count),
                notify: Notify::new(),
            }),
        }
    }

    pub fn remaining(&self) -> usize {
        self.inner.remaining.load(Ordering::Acquire)
    }

    /// ワーカー1つ分の減算ガードを発行
    pub fn guard(&self) -> CountdownGuard {
        CountdownGuard {
            countdown: self.clone(),
        }
    }

    fn decrement(&self) {
        let previous = self
            .inner
            .remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));

        if previous == Ok(1) {
            self.inner.notify.notify_waiters();
        }
    }

    /// カウントが0になるまで待機
    pub async fn wait_zero(&self) {
        loop {
            let notified = self.inner.notify.notified();
            tokio::pin!(notified);
            // 通知の取りこぼしを防ぐため、確認前に登録しておく
            notified.as_mut().enable();

            if self.remaining() == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// ドロップ時にカウントを1減らすガード
#[derive(Debug)]
pub struct CountdownGuard {
    countdown: WorkerCountdown,
}

impl Drop for CountdownGuard {
    fn drop(&mut self) {
        self.countdown.decrement();
    }
}
