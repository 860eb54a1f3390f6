// テストユーティリティ
// 統合テストで共有する作業関数と設定ヘルパー

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use worker_pool::{handler_fn, Job, JobHandler, PoolConfig};

/// ワーカー数とキュー容量を指定した設定
pub fn pool_config(workers: usize, capacity: usize) -> PoolConfig {
    PoolConfig::new(1)
        .with_workers(workers)
        .with_queue_capacity(capacity)
}

/// ペイロードを2倍にする
pub fn doubling_handler() -> impl JobHandler<Input = u64, Output = u64> {
    handler_fn(|job: Job<u64>, _cancel: CancellationToken| async move {
        Ok::<u64, anyhow::Error>(job.payload * 2)
    })
}

/// 常に失敗する
pub fn failing_handler() -> impl JobHandler<Input = u64, Output = u64> {
    handler_fn(|job: Job<u64>, _cancel: CancellationToken| async move {
        Err::<u64, anyhow::Error>(anyhow::anyhow!("payload {} rejected", job.payload))
    })
}

/// キャンセルを無視して`delay`だけ眠る
pub fn sleeping_handler(delay: Duration) -> impl JobHandler<Input = u64, Output = u64> {
    handler_fn(move |job: Job<u64>, _cancel: CancellationToken| async move {
        tokio::time::sleep(delay).await;
        Ok::<u64, anyhow::Error>(job.payload)
    })
}

/// `delay`だけ待機するが、キャンセルされたら即座に失敗する
pub fn cancellable_handler(delay: Duration) -> impl JobHandler<Input = u64, Output = u64> {
    handler_fn(move |job: Job<u64>, cancel: CancellationToken| async move {
        tokio::select! {
            _ = cancel.cancelled() => Err(anyhow::anyhow!("cancelled")),
            _ = tokio::time::sleep(delay) => Ok::<u64, anyhow::Error>(job.payload),
        }
    })
}

/// 指定したペイロードでパニックする
pub fn panicking_handler(panic_on: u64) -> impl JobHandler<Input = u64, Output = u64> {
    handler_fn(move |job: Job<u64>, _cancel: CancellationToken| async move {
        if job.payload == panic_on {
            panic!("payload {panic_on} is cursed");
        }
        Ok::<u64, anyhow::Error>(job.payload)
    })
}

/// 実行回数を数える
pub fn counting_handler(
    counter: Arc<AtomicUsize>,
    delay: Duration,
) -> impl JobHandler<Input = u64, Output = u64> {
    handler_fn(move |job: Job<u64>, _cancel: CancellationToken| {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(delay).await;
            Ok::<u64, anyhow::Error>(job.payload)
        }
    })
}
