//! Status-change notification

use async_trait::async_trait;
use std::future::Future;
use crate::error::Result;
use crate::model::StatusResponse;

/// Receives every observed status transition, in order.
///
/// The first successful fetch always counts as a transition. The observer is
/// awaited inside the polling loop, so a slow observer delays the next poll.
/// Returning an error aborts polling with
/// [`SdkError::Callback`](crate::SdkError::Callback).
#[async_trait]
pub trait StatusObserver: Send + Sync {
    async fn on_status_changed(&self, response: &StatusResponse) -> Result<()>;
}

/// Any `Fn(StatusResponse) -> impl Future<Output = Result<()>>` closure is an
/// observer. It receives its own copy of the response.
#[async_trait]
impl<F, Fut> StatusObserver for F
where
    F: Fn(StatusResponse) -> Fut + Send + Sync,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    async fn on_status_changed(&self, response: &StatusResponse) -> Result<()> {
        self(response.clone()).await
    }
}

/// Observer that ignores every transition
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

#[async_trait]
impl StatusObserver for NoopObserver {
    async fn on_status_changed(&self, _response: &StatusResponse) -> Result<()> {
        Ok(())
    }
}
