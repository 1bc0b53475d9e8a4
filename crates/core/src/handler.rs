//! Event handler trait — the abstraction over user-supplied callbacks.
//!
//! Handlers receive a [`Context`] and decide the execution's fate by
//! calling one of its action methods. The return value is otherwise
//! ignored by the dispatcher; an `Err` (or a panic) marks the item as
//! failed and triggers the runner's compensating skip.

use async_trait::async_trait;
use std::future::Future;

use crate::context::Context;
use crate::error::Result;

/// A callback registered for one event identifier.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, context: Context) -> Result<()>;
}

/// Adapter turning an async closure into an [`EventHandler`].
pub struct FnHandler<F> {
    func: F,
}

impl<F> FnHandler<F> {
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

#[async_trait]
impl<F, Fut> EventHandler for FnHandler<F>
where
    F: Fn(Context) -> Fut + Send + Sync,
    Fut: Future<Output = Result<()>> + Send,
{
    async fn handle(&self, context: Context) -> Result<()> {
        (self.func)(context).await
    }
}
