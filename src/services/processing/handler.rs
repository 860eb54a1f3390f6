// 関数アダプタ - asyncクロージャをJobHandlerとして扱う

use crate::core::{Job, JobHandler};
use anyhow::Result;
use async_trait::async_trait;
use std::future::Future;
use std::marker::PhantomData;
use tokio_util::sync::CancellationToken;

/// クロージャを包む`JobHandler`実装
pub struct FnHandler<F, I, O> {
    func: F,
    _marker: PhantomData<fn(I) -> O>,
}

/// `Fn(Job<I>, CancellationToken) -> impl Future<Output = Result<O>>`から作業関数を作成
pub fn handler_fn<F, Fut, I, O>(func: F) -> FnHandler<F, I, O>
where
    F: Fn(Job<I>, CancellationToken) -> Fut + Send + Sync,
    Fut: Future<Output = Result<O>> + Send,
{
    FnHandler {
        func,
        _marker: PhantomData,
    }
}

#[async_trait]
impl<F, Fut, I, O> JobHandler for FnHandler<F, I, O>
where
    F: Fn(Job<I>, CancellationToken) -> Fut + Send + Sync,
    Fut: Future<Output = Result<O>> + Send,
    I: Send + 'static,
    O: Send + 'static,
{
    type Input = I;
    type Output = O;

    async fn handle(&self, job: Job<I>, cancel: CancellationToken) -> Result<O> {
        (self.func)(job, cancel).await
    }
}
