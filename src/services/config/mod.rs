// 設定管理機能
// ワーカー数、キュー容量、ジョブ単位タイムアウト

pub mod implementations;

// 公開API
pub use implementations::PoolConfig;
