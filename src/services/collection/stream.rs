// ResultStream - 呼び出し側へ公開する結果ストリーム

use crate::core::JobResult;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

/// 全ワーカーの結果を1本にまとめた遅延ストリーム
///
/// 全ワーカー終了後、内部チャンネルが空になった時点で`None`を返す。
#[derive(Debug)]
pub struct ResultStream<O> {
    rx: mpsc::UnboundedReceiver<JobResult<O>>,
}

impl<O> ResultStream<O> {
    pub(crate) fn new(rx: mpsc::UnboundedReceiver<JobResult<O>>) -> Self {
        Self { rx }
    }

    /// 次の結果を待機。ストリーム終了時は`None`
    pub async fn next(&mut self) -> Option<JobResult<O>> {
        self.rx.recv().await
    }

    /// 待機せずに取得
    pub fn try_next(&mut self) -> Option<JobResult<O>> {
        self.rx.try_recv().ok()
    }

    /// ストリームが尽きるまで待機し、全結果を返す
    pub async fn drain(mut self) -> Vec<JobResult<O>> {
        let mut results = Vec::new();
        while let Some(result) = self.rx.recv().await {
            results.push(result);
        }
        results
    }

    /// `Stream`として扱う
    pub fn into_stream(self) -> UnboundedReceiverStream<JobResult<O>> {
        UnboundedReceiverStream::new(self.rx)
    }
}
