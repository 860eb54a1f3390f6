// ジョブ実行機能
// 作業関数の呼び出し、タイムアウト、パニック捕捉

pub mod handler;
pub mod worker;

// 公開API
pub use handler::{handler_fn, FnHandler};
pub use worker::execute_job;
