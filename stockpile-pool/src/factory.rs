//! Creation of pool containers and instances, delegated to the host.

use std::{
    fmt,
    future::Future,
    pin::Pin,
    task::{ready, Context, Poll},
};

use futures::{channel::oneshot, future::BoxFuture, FutureExt};
use pin_project::pin_project;

use crate::poolable::Poolable;

/// Host-side collaborator that creates containers and clones templates.
pub trait ResourceFactory<R: Poolable>: Send + Sync {
    /// Create a container scope for idle pool members, nested under `owner`.
    fn create_container(&self, name: &str, owner: &R::Scope) -> R::Scope;

    /// Clone a single instance from `template`, parented under `parent`.
    ///
    /// `parent` is `None` when a pool is forced to expand before it was ever initialised.
    fn instantiate(&self, template: &R, parent: Option<&R::Scope>) -> R;

    /// Request `count` clones of `template` as a single deferred operation.
    ///
    /// The default implementation clones synchronously and returns an already landed batch.
    fn instantiate_batch(&self, template: &R, count: usize, parent: &R::Scope) -> PendingBatch<R> {
        let instances = (0..count)
            .map(|_| self.instantiate(template, Some(parent)))
            .collect();
        PendingBatch::ready(instances)
    }
}

/// Outcome of a deferred batch operation.
///
/// A completion being delivered and the operation being done are separate facts: the pool only
/// trusts `instances` when `done` is set.
#[derive(Debug)]
pub struct BatchCompletion<R> {
    /// Whether the operation actually completed.
    pub done: bool,
    /// Completion ratio in range `0.0..=1.0`, for diagnostics.
    pub progress: f32,
    /// Created instances.
    pub instances: Vec<R>,
}

impl<R> BatchCompletion<R> {
    /// Successfully completed batch.
    #[must_use]
    pub fn done(instances: Vec<R>) -> Self {
        Self {
            done: true,
            progress: 1.0,
            instances,
        }
    }

    /// Batch whose completion fired before the operation was done.
    #[must_use]
    pub fn incomplete(progress: f32) -> Self {
        Self {
            done: false,
            progress,
            instances: Vec::new(),
        }
    }
}

/// Deferred batch of instances requested from a [`ResourceFactory`].
#[must_use = "batch instances are lost unless the pending batch is polled to completion"]
pub struct PendingBatch<R> {
    /// Number of instances requested.
    requested: usize,
    /// Type-erased batch operation.
    inner: BoxFuture<'static, BatchCompletion<R>>,
}

impl<R: Send + 'static> PendingBatch<R> {
    /// Batch that has already landed.
    pub fn ready(instances: Vec<R>) -> Self {
        Self {
            requested: instances.len(),
            inner: futures::future::ready(BatchCompletion::done(instances)).boxed(),
        }
    }

    /// Batch backed by an arbitrary future.
    pub fn from_future<F>(requested: usize, fut: F) -> Self
    where
        F: Future<Output = BatchCompletion<R>> + Send + 'static,
    {
        Self {
            requested,
            inner: fut.boxed(),
        }
    }

    /// Batch delivered through a oneshot channel.
    ///
    /// If the sender is dropped without sending, the batch completes as not done.
    pub fn from_receiver(requested: usize, rx: oneshot::Receiver<Vec<R>>) -> Self {
        Self::from_future(requested, ReceiverBatch { rx })
    }

    /// Batch produced by a spawned task.
    ///
    /// If the task panics or is cancelled, the batch completes as not done.
    #[cfg(feature = "tokio")]
    pub fn from_join_handle(requested: usize, handle: tokio::task::JoinHandle<Vec<R>>) -> Self {
        Self::from_future(requested, async move {
            match handle.await {
                Ok(instances) => BatchCompletion::done(instances),
                Err(err) => {
                    tracing::warn!(%err, "batch instantiation task failed");
                    BatchCompletion::incomplete(0.0)
                }
            }
        })
    }
}

impl<R> PendingBatch<R> {
    /// Number of instances requested.
    #[must_use]
    pub fn requested(&self) -> usize {
        self.requested
    }

    /// Poll once without blocking, using a no-op waker.
    pub(crate) fn poll_now(&mut self) -> Option<BatchCompletion<R>> {
        (&mut self.inner).now_or_never()
    }
}

impl<R> Future for PendingBatch<R> {
    type Output = BatchCompletion<R>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.get_mut().inner.as_mut().poll(cx)
    }
}

impl<R> fmt::Debug for PendingBatch<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingBatch")
            .field("requested", &self.requested)
            .finish_non_exhaustive()
    }
}

/// Future for [`PendingBatch::from_receiver`].
#[pin_project]
struct ReceiverBatch<R> {
    /// Receiving end of the batch channel.
    #[pin]
    rx: oneshot::Receiver<Vec<R>>,
}

impl<R> Future for ReceiverBatch<R> {
    type Output = BatchCompletion<R>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        Poll::Ready(match ready!(this.rx.poll(cx)) {
            Ok(instances) => BatchCompletion::done(instances),
            Err(oneshot::Canceled) => BatchCompletion::incomplete(0.0),
        })
    }
}
