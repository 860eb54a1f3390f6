// エラーハンドリングの統合テスト
use crate::fixtures::{
    doubling_handler, failing_handler, panicking_handler, pool_config, sleeping_handler,
};
use std::time::{Duration, Instant};
use tokio::time::timeout;
use worker_pool::{create_pool, JobErrorKind, PoolConfig, PoolError, PoolState, WorkerPool};

#[tokio::test]
async fn test_zero_workers_is_configuration_error() {
    let result = WorkerPool::new(pool_config(0, 5), doubling_handler());

    let error = match result {
        Err(error) => error,
        Ok(_) => panic!("pool must not be created with zero workers"),
    };
    assert!(matches!(error, PoolError::Configuration { .. }));
    assert!(!error.is_recoverable());
    assert!(error.to_string().contains("worker_count"));
}

#[tokio::test]
async fn test_submit_after_close_fails_fast() {
    let pool = create_pool(pool_config(1, 1), doubling_handler()).unwrap();
    pool.close();

    let result = timeout(Duration::from_millis(200), pool.submit(1))
        .await
        .expect("submit after close must not block");

    match result {
        Err(error) => assert!(error.is_closed()),
        Ok(id) => panic!("{id} accepted after close"),
    }
    assert_eq!(pool.submitted_count(), 0);
}

#[tokio::test]
async fn test_always_failing_handler() {
    let pool = create_pool(pool_config(3, 5), failing_handler()).unwrap();
    let results = pool.collect().unwrap();

    for payload in 1..=10 {
        pool.submit(payload).await.unwrap();
    }
    pool.close();

    let results = results.drain().await;
    assert_eq!(results.len(), 10);
    for result in &results {
        let error = result.error().expect("every job fails");
        assert_eq!(error.kind, JobErrorKind::Failure);
        assert!(error.message.contains("rejected"));
    }

    let summary = pool.wait().await.unwrap();
    assert_eq!(summary.failed, 10);
    assert_eq!(summary.succeeded, 0);
    assert_eq!(pool.state(), PoolState::Stopped);
}

#[tokio::test]
async fn test_job_timeout_is_reported_promptly() {
    let config = PoolConfig::new(1)
        .with_workers(2)
        .with_queue_capacity(1)
        .with_job_timeout(Duration::from_secs(1));
    let pool = create_pool(config, sleeping_handler(Duration::from_secs(5))).unwrap();
    let mut results = pool.collect().unwrap();

    let started = Instant::now();
    pool.submit(1).await.unwrap();
    pool.close();

    let result = results.next().await.unwrap();
    let elapsed = started.elapsed();

    assert_eq!(result.error().unwrap().kind, JobErrorKind::Timeout);
    assert!(elapsed >= Duration::from_millis(900), "elapsed {elapsed:?}");
    assert!(elapsed < Duration::from_secs(3), "elapsed {elapsed:?}");
    assert!(results.next().await.is_none());

    let summary = pool.wait().await.unwrap();
    assert_eq!(summary.timed_out, 1);
}

#[tokio::test]
async fn test_panic_becomes_result_and_worker_survives() {
    let pool = create_pool(pool_config(1, 10), panicking_handler(3)).unwrap();
    let results = pool.collect().unwrap();

    for payload in 1..=5 {
        pool.submit(payload).await.unwrap();
    }
    pool.close();

    let results = results.drain().await;
    assert_eq!(results.len(), 5);

    let panicked: Vec<_> = results
        .iter()
        .filter_map(|r| r.error())
        .filter(|e| e.kind == JobErrorKind::Panicked)
        .collect();
    assert_eq!(panicked.len(), 1);
    assert!(panicked[0].message.contains("cursed"));

    let summary = pool.wait().await.unwrap();
    assert_eq!(summary.panicked, 1);
    assert_eq!(summary.succeeded, 4);
}

#[tokio::test]
async fn test_try_submit_reports_full_queue() {
    let pool = WorkerPool::new(pool_config(1, 2), doubling_handler()).unwrap();
    pool.try_submit(1).unwrap();
    pool.try_submit(2).unwrap();

    let error = pool.try_submit(3).unwrap_err();
    assert!(matches!(error, PoolError::QueueFull { capacity: 2 }));
    assert!(error.is_recoverable());
}

#[tokio::test]
async fn test_stopped_pool_rejects_submit() {
    let pool = create_pool(pool_config(1, 1), doubling_handler()).unwrap();
    pool.close();
    pool.wait().await.unwrap();

    assert!(matches!(pool.submit(1).await, Err(PoolError::PoolStopped)));
    assert!(matches!(pool.try_submit(1), Err(PoolError::PoolStopped)));
}

#[tokio::test]
async fn test_wait_on_unstarted_pool() {
    let pool = WorkerPool::new(pool_config(1, 1), doubling_handler()).unwrap();
    assert!(matches!(pool.wait().await, Err(PoolError::NotStarted)));
}
