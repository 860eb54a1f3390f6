// キャンセルの統合テスト
use crate::fixtures::{cancellable_handler, counting_handler, pool_config, sleeping_handler};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use worker_pool::{create_pool, PoolError, PoolState, WorkerPool};

#[tokio::test]
async fn test_cancel_with_full_queue_yields_at_most_one_result() {
    let counter = Arc::new(AtomicUsize::new(0));
    let handler = counting_handler(Arc::clone(&counter), Duration::from_millis(50));
    let pool = WorkerPool::new(pool_config(1, 100), handler).unwrap();

    for payload in 1..=100 {
        pool.submit(payload).await.unwrap();
    }
    pool.start().unwrap();
    pool.cancel();

    let results = timeout(Duration::from_secs(2), pool.collect().unwrap().drain())
        .await
        .expect("cancelled pool must close its stream");
    assert!(results.len() <= 1, "got {} results", results.len());
    assert!(counter.load(Ordering::SeqCst) <= 1);

    let summary = pool.wait().await.unwrap();
    assert_eq!(summary.submitted, 100);
    assert_eq!(summary.completed + summary.dropped, 100);
    assert_eq!(pool.state(), PoolState::Stopped);
    assert_eq!(pool.queued_jobs(), 0);
}

#[tokio::test]
async fn test_cancel_releases_blocked_submitter() {
    let pool = Arc::new(
        create_pool(pool_config(1, 1), sleeping_handler(Duration::from_secs(10))).unwrap(),
    );

    // 1件は実行中、1件はキュー内
    pool.submit(1).await.unwrap();
    pool.submit(2).await.unwrap();

    let blocked = {
        let pool = Arc::clone(&pool);
        tokio::spawn(async move { pool.submit(3).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!blocked.is_finished());

    pool.cancel();
    let result = timeout(Duration::from_secs(1), blocked)
        .await
        .expect("cancel must wake blocked submitters")
        .unwrap();
    assert!(matches!(result, Err(PoolError::QueueClosed)));
}

#[tokio::test]
async fn test_running_job_observes_cancellation() {
    let pool = create_pool(pool_config(2, 4), cancellable_handler(Duration::from_secs(30))).unwrap();
    let results = pool.collect().unwrap();

    pool.submit(1).await.unwrap();
    pool.submit(2).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    pool.cancel();

    let results = timeout(Duration::from_secs(2), results.drain())
        .await
        .expect("work functions stop on cancellation");
    assert!(results.iter().all(|r| !r.is_success()));

    let summary = pool.wait().await.unwrap();
    assert_eq!(summary.succeeded, 0);
}

#[tokio::test]
async fn test_cancel_is_idempotent_and_blocks_submit() {
    let pool = create_pool(pool_config(2, 4), sleeping_handler(Duration::from_millis(1))).unwrap();
    pool.cancel();
    pool.cancel();
    assert!(matches!(
        pool.state(),
        PoolState::Cancelling | PoolState::Stopped
    ));

    assert!(pool.submit(1).await.is_err());
    pool.wait().await.unwrap();

    // 停止後のcancelは何もしない
    pool.cancel();
    assert_eq!(pool.state(), PoolState::Stopped);
}

#[tokio::test]
async fn test_draining_then_cancel() {
    let pool = create_pool(pool_config(1, 10), cancellable_handler(Duration::from_secs(30))).unwrap();
    for payload in 1..=5 {
        pool.submit(payload).await.unwrap();
    }
    pool.close();
    assert!(matches!(pool.state(), PoolState::Draining));

    pool.cancel();
    let summary = timeout(Duration::from_secs(2), pool.wait())
        .await
        .expect("draining pool must stop after cancel")
        .unwrap();

    assert_eq!(summary.submitted, 5);
    assert!(summary.dropped >= 4);
}
