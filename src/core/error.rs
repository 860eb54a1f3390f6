// ワーカープールのエラー型定義
// ジョブ単位の失敗は types::JobError として結果に格納し、ここには含めない

use thiserror::Error;

/// プール操作のエラー型
#[derive(Error, Debug)]
pub enum PoolError {
    #[error("設定エラー: {field} - {reason}")]
    Configuration { field: String, reason: String },

    #[error("キューは閉じられています")]
    QueueClosed,

    #[error("キューが満杯です (容量: {capacity})")]
    QueueFull { capacity: usize },

    #[error("プールは既に停止しています")]
    PoolStopped,

    #[error("プールは既に起動済みです")]
    AlreadyStarted,

    #[error("プールはまだ起動されていません")]
    NotStarted,

    #[error("結果ストリームは既に取得されています")]
    ResultsTaken,

    #[error("内部エラー: {source}")]
    Internal {
        #[source]
        source: anyhow::Error,
    },
}

impl PoolError {
    /// 設定エラーの作成
    pub fn configuration(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Configuration {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// 内部エラーの作成
    pub fn internal(source: anyhow::Error) -> Self {
        Self::Internal { source }
    }

    /// 呼び出し側の対処で継続可能なエラーか
    ///
    /// 設定エラーは使用不能なプールを意味するため回復不可。
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Configuration { .. } | Self::Internal { .. } => false,
            Self::QueueClosed
            | Self::QueueFull { .. }
            | Self::PoolStopped
            | Self::AlreadyStarted
            | Self::NotStarted
            | Self::ResultsTaken => true,
        }
    }

    /// 投入を止めるべきエラーか
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::QueueClosed | Self::PoolStopped)
    }
}

/// プール操作の結果型
pub type PoolResult<T> = std::result::Result<T, PoolError>;

impl From<anyhow::Error> for PoolError {
    fn from(error: anyhow::Error) -> Self {
        PoolError::Internal { source: error }
    }
}
