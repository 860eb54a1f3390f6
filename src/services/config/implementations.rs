// プール設定の具象実装

use crate::core::{PoolError, PoolResult};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// プール設定
///
/// 生成後は不変。`WorkerPool::new`で検証される。
/// `queue_capacity = 0`は同期的な受け渡し（ワーカーが受け取るまで投入側が待つ）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    worker_count: usize,
    queue_capacity: usize,
    #[serde(rename = "job_timeout_ms", with = "optional_millis")]
    job_timeout: Option<Duration>,
    result_buffer: usize,
}

impl PoolConfig {
    pub fn new(cpu_count: usize) -> Self {
        Self {
            worker_count: cpu_count.max(1),
            queue_capacity: 100,
            job_timeout: None,
            result_buffer: 100,
        }
    }

    pub fn with_workers(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    pub fn with_queue_capacity(mut self, queue_capacity: usize) -> Self {
        self.queue_capacity = queue_capacity;
        self
    }

    pub fn with_job_timeout(mut self, timeout: Duration) -> Self {
        self.job_timeout = Some(timeout);
        self
    }

    pub fn without_job_timeout(mut self) -> Self {
        self.job_timeout = None;
        self
    }

    pub fn with_result_buffer(mut self, result_buffer: usize) -> Self {
        self.result_buffer = result_buffer;
        self
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity
    }

    pub fn job_timeout(&self) -> Option<Duration> {
        self.job_timeout
    }

    pub fn result_buffer(&self) -> usize {
        self.result_buffer
    }

    /// 同期受け渡しモードか
    pub fn is_rendezvous(&self) -> bool {
        self.queue_capacity == 0
    }

    /// 設定の検証
    pub fn validate(&self) -> PoolResult<()> {
        if self.worker_count == 0 {
            return Err(PoolError::configuration(
                "worker_count",
                "ワーカー数は1以上である必要があります",
            ));
        }

        if self.result_buffer == 0 {
            return Err(PoolError::configuration(
                "result_buffer",
                "結果バッファは1以上である必要があります",
            ));
        }

        if self.job_timeout == Some(Duration::ZERO) {
            return Err(PoolError::configuration(
                "job_timeout_ms",
                "タイムアウトは0より大きい必要があります",
            ));
        }

        Ok(())
    }

    /// JSON文字列から読み込み
    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        let config: Self = serde_json::from_str(json).context("設定JSONの解析に失敗しました")?;
        config.validate()?;
        Ok(config)
    }

    /// JSONファイルから読み込み
    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("設定ファイルを読み込めません: {}", path.display()))?;
        Self::from_json_str(&content)
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::new(num_cpus::get())
    }
}

mod optional_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(duration) => serializer.serialize_some(&(duration.as_millis() as u64)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
    }
}
