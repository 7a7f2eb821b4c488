//! Delegate runner.
//!
//! # Responsibilities
//! - Run a unit of work on its own Tokio task under a cancellable context
//! - Enforce an optional concurrency budget shared by every clone
//! - Recover panics inside the work as [`MemberError::RecoveredFault`]
//!
//! # Design Decisions
//! - Cancellation is checked before a slot is taken and while waiting for
//!   one; in both cases the work is never invoked
//! - The slot is held until the work finishes, even if it panics
//! - Dropping a [`DelegateHandle`] detaches the task (fire-and-forget)

mod fault;

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::{AbortHandle, JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::error::{BoxError, MemberError};

/// Concurrency budget for a [`Delegate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Concurrency {
    #[default]
    Unbounded,
    /// At most this many units of work run at once. `Bounded(0)` admits
    /// nothing; callers wait until their context is cancelled. Budgets
    /// above [`Semaphore::MAX_PERMITS`] are clamped to it.
    Bounded(usize),
}

impl Concurrency {
    /// Map a signed limit to a budget. Any negative value means unbounded.
    /// Limits above [`Semaphore::MAX_PERMITS`] are clamped to it.
    pub fn from_limit(limit: i64) -> Self {
        if limit < 0 {
            return Concurrency::Unbounded;
        }
        let n = usize::try_from(limit).unwrap_or(Semaphore::MAX_PERMITS);
        Concurrency::Bounded(n.min(Semaphore::MAX_PERMITS))
    }
}

/// Runs work on independent tasks with fault recovery.
#[derive(Debug, Clone, Default)]
pub struct Delegate {
    slots: Option<Arc<Semaphore>>,
}

impl Delegate {
    pub fn new(concurrency: Concurrency) -> Self {
        let slots = match concurrency {
            Concurrency::Unbounded => None,
            Concurrency::Bounded(n) => {
                Some(Arc::new(Semaphore::new(n.min(Semaphore::MAX_PERMITS))))
            }
        };
        Self { slots }
    }

    pub fn unbounded() -> Self {
        Self::new(Concurrency::Unbounded)
    }

    /// Free slots, or `None` when unbounded.
    pub fn available_slots(&self) -> Option<usize> {
        self.slots.as_ref().map(|s| s.available_permits())
    }

    /// Schedule `work` and return a handle to its outcome.
    ///
    /// Waits for a slot when the budget is exhausted. Returns
    /// [`MemberError::Cancelled`] without invoking `work` if `ctx` is
    /// cancelled first.
    pub async fn spawn<F, Fut>(
        &self,
        ctx: &CancellationToken,
        work: F,
    ) -> Result<DelegateHandle, MemberError>
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        if ctx.is_cancelled() {
            return Err(MemberError::Cancelled);
        }

        let permit = match &self.slots {
            None => None,
            Some(slots) => {
                let permit = tokio::select! {
                    biased;
                    _ = ctx.cancelled() => return Err(MemberError::Cancelled),
                    permit = slots.clone().acquire_owned() => permit,
                };
                // The semaphore is never closed; treat it as cancellation if it is.
                Some(permit.map_err(|_| MemberError::Cancelled)?)
            }
        };

        let ctx = ctx.clone();
        let inner = tokio::spawn(async move {
            let _permit = permit;
            work(ctx).await
        });

        Ok(DelegateHandle { inner })
    }

    /// Run `work` to completion and return its outcome.
    pub async fn run<F, Fut>(&self, ctx: &CancellationToken, work: F) -> Result<(), MemberError>
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        self.spawn(ctx, work).await?.join().await
    }
}

/// Handle to work scheduled by [`Delegate::spawn`].
#[derive(Debug)]
pub struct DelegateHandle {
    inner: JoinHandle<Result<(), BoxError>>,
}

impl DelegateHandle {
    /// Wait for the work to finish.
    pub async fn join(self) -> Result<(), MemberError> {
        match self.inner.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(err)) => Err(MemberError::failed(err)),
            Err(join_err) if join_err.is_panic() => Err(MemberError::RecoveredFault(
                fault::panic_message(join_err.into_panic()),
            )),
            Err(_) => Err(MemberError::Cancelled),
        }
    }

    pub fn abort(&self) {
        self.inner.abort();
    }

    /// Abort the work without holding on to the handle.
    pub fn abort_handle(&self) -> AbortHandle {
        self.inner.abort_handle()
    }

    pub fn is_finished(&self) -> bool {
        self.inner.is_finished()
    }
}
