// プール状態の管理
// watchチャンネルで状態遷移を公開し、停止待機を可能にする

use crate::core::{PoolError, PoolResult, PoolState, PoolSummary};
use std::sync::{Mutex, PoisonError};
use tokio::sync::watch;

pub(crate) struct StateCell {
    tx: watch::Sender<PoolState>,
    summary: Mutex<Option<PoolSummary>>,
}

impl StateCell {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(PoolState::Created);
        Self {
            tx,
            summary: Mutex::new(None),
        }
    }

    pub fn get(&self) -> PoolState {
        *self.tx.borrow()
    }

    /// 許可された遷移のみ適用する。適用したらtrue
    pub fn transition(&self, next: PoolState) -> bool {
        self.tx.send_if_modified(|state| {
            if state.can_transition_to(next) {
                tracing::debug!(from = %state, to = %next, "pool state changed");
                *state = next;
                true
            } else {
                false
            }
        })
    }

    /// 収集完了を記録し`Stopped`へ遷移
    pub fn finish(&self, summary: Option<PoolSummary>) {
        *self.summary.lock().unwrap_or_else(PoisonError::into_inner) = summary;
        self.transition(PoolState::Stopped);
    }

    /// `Stopped`になるまで待機
    pub async fn wait_stopped(&self) -> PoolResult<PoolSummary> {
        let mut rx = self.tx.subscribe();
        rx.wait_for(PoolState::is_terminal)
            .await
            .map_err(|e| PoolError::internal(anyhow::anyhow!("state channel closed: {e}")))?;

        self.summary
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(|| {
                PoolError::internal(anyhow::anyhow!("result collector terminated abnormally"))
            })
    }
}
