// 結果収集機能
// ワーカー出力のファンイン、残りワーカー数の追跡、呼び出し側へのストリーム

pub mod collector;
pub mod countdown;
pub mod stream;

// 公開API
pub use collector::spawn_result_collector;
pub use countdown::{CountdownGuard, WorkerCountdown};
pub use stream::ResultStream;
