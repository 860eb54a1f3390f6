// 統合テスト

#[path = "../fixtures/mod.rs"]
mod fixtures;

mod test_cancellation;
mod test_end_to_end;
mod test_error_handling;
