use crate::cli::args::RunArgs;
use crate::{
    core::{Job, JobHandler, PoolSummary},
    engine::create_pool_with_reporter,
    services::{handler_fn, LogProgressReporter},
};
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// 合成ジョブの作業関数
///
/// `delay`だけ待機してペイロードを2倍にする。`fail_every`の倍数は失敗、
/// `panic_on`と一致するペイロードはパニックする。
pub fn synthetic_handler(
    delay: Duration,
    fail_every: u64,
    panic_on: Option<u64>,
) -> impl JobHandler<Input = u64, Output = u64> {
    handler_fn(move |job: Job<u64>, cancel: CancellationToken| async move {
        let payload = job.payload;
        if panic_on == Some(payload) {
            panic!("injected panic for payload {payload}");
        }

        tokio::select! {
            _ = cancel.cancelled() => {
                return Err(anyhow::anyhow!("cancelled while processing payload {payload}"));
            }
            _ = tokio::time::sleep(delay) => {}
        }

        if fail_every > 0 && payload % fail_every == 0 {
            return Err(anyhow::anyhow!("injected failure for payload {payload}"));
        }
        Ok::<u64, anyhow::Error>(payload * 2)
    })
}

/// Execute run command
pub async fn execute_run(args: RunArgs) -> Result<()> {
    let config = args.pool.resolve()?;
    tracing::debug!(?config, "effective configuration");

    let handler = synthetic_handler(
        Duration::from_millis(args.delay_ms),
        args.fail_every,
        args.panic_on,
    );
    let reporter = if args.json {
        LogProgressReporter::quiet()
    } else {
        LogProgressReporter::new().with_progress_interval(args.jobs.div_ceil(10).max(1) as usize)
    };

    let pool = Arc::new(
        create_pool_with_reporter(config, handler, reporter).context("プールを起動できません")?,
    );
    let mut results = pool.collect()?;

    if let Some(cancel_after) = args.cancel_after_ms {
        let pool = Arc::clone(&pool);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(cancel_after)).await;
            pool.cancel();
        });
    }

    // 投入しながら結果を読む（容量0でも詰まらないように別タスクで投入）
    let producer = {
        let pool = Arc::clone(&pool);
        let jobs = args.jobs;
        tokio::spawn(async move {
            for payload in 1..=jobs {
                if let Err(error) = pool.submit(payload).await {
                    pool.close();
                    if error.is_closed() {
                        tracing::warn!(payload, "submission stopped: {error}");
                        return Ok(());
                    }
                    return Err(error);
                }
            }
            pool.close();
            Ok(())
        })
    };

    while let Some(result) = results.next().await {
        if let Err(error) = &result.outcome {
            tracing::debug!(job_id = %result.job_id, worker_id = result.worker_id, %error, "job failed");
        }
    }

    producer
        .await
        .context("投入タスクが異常終了しました")?
        .context("ジョブを投入できません")?;
    let summary = pool.wait().await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn print_summary(summary: &PoolSummary) {
    println!("\n✅ 処理完了!");
    println!("📊 処理結果:");
    println!("   - 投入数: {}", summary.submitted);
    println!("   - 完了数: {}", summary.completed);
    println!("   - 成功数: {}", summary.succeeded);
    println!("   - 失敗数: {}", summary.failed);
    println!("   - タイムアウト数: {}", summary.timed_out);
    println!("   - パニック数: {}", summary.panicked);
    println!("   - 破棄数: {}", summary.dropped);
    println!("   - 総処理時間: {:.2}秒", summary.elapsed.as_secs_f64());
    println!(
        "   - 平均処理時間: {:.2}ms/ジョブ",
        summary.average_time_per_job_ms()
    );

    if summary.dropped > 0 {
        println!("⚠️  {}個のジョブがキャンセルにより破棄されました", summary.dropped);
    }
}
