// エンドツーエンドの統合テスト
use crate::fixtures::{counting_handler, doubling_handler, pool_config};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tokio_stream::StreamExt;
use worker_pool::{create_pool, run_to_completion, PoolState, WorkerPool};

#[tokio::test]
async fn test_doubling_ten_jobs_three_workers() {
    let pool = create_pool(pool_config(3, 5), doubling_handler()).unwrap();
    let results = pool.collect().unwrap();

    for payload in 1..=10 {
        pool.submit(payload).await.unwrap();
    }
    pool.close();

    let results = results.drain().await;
    let values: HashSet<u64> = results.iter().filter_map(|r| r.value().copied()).collect();
    let expected: HashSet<u64> = (1..=10).map(|x| x * 2).collect();

    assert_eq!(results.len(), 10);
    assert_eq!(values, expected);
    assert!(results.iter().all(|r| r.worker_id < 3));

    let summary = pool.wait().await.unwrap();
    assert_eq!(summary.submitted, 10);
    assert_eq!(summary.succeeded, 10);
    assert_eq!(pool.state(), PoolState::Stopped);
}

#[tokio::test]
async fn test_every_job_yields_one_result_with_unique_id() {
    let pool = create_pool(pool_config(4, 8), doubling_handler()).unwrap();
    let results = pool.collect().unwrap();

    let mut submitted = HashSet::new();
    for payload in 0..200 {
        submitted.insert(pool.submit(payload).await.unwrap());
    }
    pool.close();

    let results = results.drain().await;
    let mut seen = HashSet::new();
    for result in &results {
        assert!(seen.insert(result.job_id), "{} seen twice", result.job_id);
    }

    assert_eq!(results.len(), 200);
    assert_eq!(seen, submitted);
}

#[tokio::test]
async fn test_rendezvous_queue_processes_all_jobs() {
    let pool = Arc::new(create_pool(pool_config(2, 0), doubling_handler()).unwrap());
    let results = pool.collect().unwrap();

    let producer = {
        let pool = Arc::clone(&pool);
        tokio::spawn(async move {
            for payload in 1..=20 {
                pool.submit(payload).await.unwrap();
            }
            pool.close();
        })
    };

    let results = timeout(Duration::from_secs(5), results.drain())
        .await
        .expect("rendezvous pool must not deadlock");
    producer.await.unwrap();

    assert_eq!(results.len(), 20);
    assert_eq!(pool.queued_jobs(), 0);
}

#[tokio::test]
async fn test_workers_run_concurrently() {
    let counter = Arc::new(AtomicUsize::new(0));
    let handler = counting_handler(Arc::clone(&counter), Duration::from_millis(200));
    let pool = create_pool(pool_config(4, 4), handler).unwrap();

    let started = std::time::Instant::now();
    for payload in 1..=4 {
        pool.submit(payload).await.unwrap();
    }
    pool.close();
    pool.wait().await.unwrap();

    assert_eq!(counter.load(Ordering::SeqCst), 4);
    assert!(
        started.elapsed() < Duration::from_millis(700),
        "4 jobs on 4 workers should overlap"
    );
}

#[tokio::test]
async fn test_result_stream_as_stream() {
    let pool = create_pool(pool_config(2, 4), doubling_handler()).unwrap();
    let stream = pool.collect().unwrap().into_stream();

    for payload in 1..=5 {
        pool.submit(payload).await.unwrap();
    }
    pool.close();

    let mut total: u64 = stream
        .filter_map(|result| result.value().copied())
        .fold(0, |acc, value| acc + value)
        .await;
    total /= 2;
    assert_eq!(total, 15);
}

#[tokio::test]
async fn test_wait_without_consuming_results() {
    let pool = create_pool(pool_config(2, 2), doubling_handler()).unwrap();
    for payload in 1..=50 {
        pool.submit(payload).await.unwrap();
    }
    pool.close();

    let summary = timeout(Duration::from_secs(5), pool.wait())
        .await
        .expect("wait must not depend on the result stream")
        .unwrap();
    assert_eq!(summary.completed, 50);

    // 読まなかった結果は後から取得できる
    let results = pool.collect().unwrap().drain().await;
    assert_eq!(results.len(), 50);
}

#[tokio::test]
async fn test_submit_before_start_is_buffered() {
    let pool = WorkerPool::new(pool_config(2, 10), doubling_handler()).unwrap();
    for payload in 1..=5 {
        pool.submit(payload).await.unwrap();
    }
    assert_eq!(pool.queued_jobs(), 5);

    pool.start().unwrap();
    pool.close();

    let summary = pool.wait().await.unwrap();
    assert_eq!(summary.succeeded, 5);
}

#[tokio::test]
async fn test_run_to_completion_summary() {
    let (results, summary) = run_to_completion(pool_config(3, 0), doubling_handler(), 1..=12)
        .await
        .unwrap();

    assert_eq!(results.len(), 12);
    assert_eq!(summary.submitted, 12);
    assert_eq!(summary.completed, 12);
    assert_eq!(summary.dropped, 0);
    assert!(summary.average_time_per_job_ms() >= 0.0);
}
