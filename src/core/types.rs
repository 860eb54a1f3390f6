// ワーカープールで扱うデータ型定義

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// ジョブ識別子
///
/// プールが採番する場合は投入順に1から単調増加する。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct JobId(pub u64);

impl JobId {
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job-{}", self.0)
    }
}

impl From<u64> for JobId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// ワーカー識別子（診断用のタグのみ）
pub type WorkerId = usize;

/// 単一の作業単位
///
/// 投入後は不変。ワーカーに取得された時点でそのワーカーへ所有権が移る。
#[derive(Debug, Clone, PartialEq)]
pub struct Job<I> {
    pub id: JobId,
    pub payload: I,
}

impl<I> Job<I> {
    pub fn new(id: impl Into<JobId>, payload: I) -> Self {
        Self {
            id: id.into(),
            payload,
        }
    }
}

/// ジョブ失敗の種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobErrorKind {
    /// 作業関数がエラーを返した
    Failure,
    /// ジョブ単位のタイムアウトを超過した
    Timeout,
    /// 作業関数がパニックした
    Panicked,
    /// ランタイムによってタスクが破棄された
    Aborted,
}

impl JobErrorKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Failure => "failure",
            Self::Timeout => "timeout",
            Self::Panicked => "panicked",
            Self::Aborted => "aborted",
        }
    }
}

impl fmt::Display for JobErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// ジョブ単位のエラー
///
/// ワーカー境界を越えて伝播させず、`JobResult`のデータとして扱う。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct JobError {
    pub kind: JobErrorKind,
    pub message: String,
}

impl JobError {
    pub fn new(kind: JobErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(JobErrorKind::Failure, message)
    }

    pub fn timeout(limit: Duration) -> Self {
        Self::new(
            JobErrorKind::Timeout,
            format!("job exceeded {}ms", limit.as_millis()),
        )
    }

    pub fn panicked(message: impl Into<String>) -> Self {
        Self::new(JobErrorKind::Panicked, message)
    }

    pub fn aborted(message: impl Into<String>) -> Self {
        Self::new(JobErrorKind::Aborted, message)
    }

    pub fn is_timeout(&self) -> bool {
        self.kind == JobErrorKind::Timeout
    }
}

/// 個別ジョブの結果
#[derive(Debug, Clone, PartialEq)]
pub struct JobResult<O> {
    pub job_id: JobId,
    pub worker_id: WorkerId,
    pub outcome: Result<O, JobError>,
    pub elapsed: Duration,
}

impl<O> JobResult<O> {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn value(&self) -> Option<&O> {
        self.outcome.as_ref().ok()
    }

    pub fn error(&self) -> Option<&JobError> {
        self.outcome.as_ref().err()
    }

    pub fn into_outcome(self) -> Result<O, JobError> {
        self.outcome
    }
}

/// プール全体の状態
///
/// `Created → Running → (Draining | Cancelling) → Stopped`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolState {
    Created,
    Running,
    Draining,
    Cancelling,
    Stopped,
}

impl PoolState {
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Stopped)
    }

    /// 許可された遷移かどうか
    ///
    /// `Stopped`へは`Draining`か`Cancelling`を経由してのみ到達する。
    pub fn can_transition_to(&self, next: PoolState) -> bool {
        use PoolState::*;
        matches!(
            (self, next),
            (Created, Running)
                | (Created, Draining)
                | (Created, Cancelling)
                | (Running, Draining)
                | (Running, Cancelling)
                | (Draining, Cancelling)
                | (Draining, Stopped)
                | (Cancelling, Stopped)
        )
    }
}

impl fmt::Display for PoolState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Created => "created",
            Self::Running => "running",
            Self::Draining => "draining",
            Self::Cancelling => "cancelling",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// プール実行全体のサマリー
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolSummary {
    pub submitted: usize,
    pub completed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub timed_out: usize,
    pub panicked: usize,
    /// キャンセルにより未実行のまま破棄されたジョブ数
    pub dropped: usize,
    pub started_at: DateTime<Utc>,
    #[serde(with = "duration_millis")]
    pub elapsed: Duration,
}

impl PoolSummary {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            submitted: 0,
            completed: 0,
            succeeded: 0,
            failed: 0,
            timed_out: 0,
            panicked: 0,
            dropped: 0,
            started_at,
            elapsed: Duration::ZERO,
        }
    }

    /// 結果1件をカウントに反映
    pub fn record(&mut self, outcome: Result<(), &JobError>) {
        self.completed += 1;
        match outcome {
            Ok(()) => self.succeeded += 1,
            Err(error) => {
                self.failed += 1;
                match error.kind {
                    JobErrorKind::Timeout => self.timed_out += 1,
                    JobErrorKind::Panicked => self.panicked += 1,
                    JobErrorKind::Failure | JobErrorKind::Aborted => {}
                }
            }
        }
    }

    /// 平均処理時間（ミリ秒）
    pub fn average_time_per_job_ms(&self) -> f64 {
        if self.completed == 0 {
            0.0
        } else {
            self.elapsed.as_millis() as f64 / self.completed as f64
        }
    }
}

/// `Duration`をミリ秒整数として(de)serializeする
pub(crate) mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
