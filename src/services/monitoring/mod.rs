// 進捗監視機能
// ワーカー起動、ジョブ失敗、進捗、停止の報告

pub mod implementations;

// 公開API
pub use implementations::{LogProgressReporter, NoOpProgressReporter};
