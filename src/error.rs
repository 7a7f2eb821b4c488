//! Error types shared by the delegate runner and the lifecycle admin.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

/// Error type returned by member `start` / `shutdown` implementations.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Outcome of a single unit of work run through the delegate runner.
#[derive(Debug, Clone, Error)]
pub enum MemberError {
    /// The work returned an error. The original value is kept and can be
    /// recovered with [`MemberError::downcast_ref`].
    #[error("{0}")]
    Failed(Arc<dyn StdError + Send + Sync + 'static>),

    /// The work panicked; the panic payload was captured as a message.
    #[error("recovered fault: {0}")]
    RecoveredFault(String),

    /// The context was cancelled before the work was scheduled, or the task
    /// was aborted.
    #[error("cancelled before completion")]
    Cancelled,
}

impl MemberError {
    /// Wrap an error returned by member code.
    pub fn failed(err: BoxError) -> Self {
        MemberError::Failed(Arc::from(err))
    }

    /// Borrow the underlying member error as a concrete type.
    pub fn downcast_ref<T: StdError + 'static>(&self) -> Option<&T> {
        match self {
            MemberError::Failed(inner) => inner.downcast_ref::<T>(),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, MemberError::Cancelled)
    }

    pub fn is_fault(&self) -> bool {
        matches!(self, MemberError::RecoveredFault(_))
    }
}

/// Errors raised by [`LifeAdmin`](crate::lifecycle::LifeAdmin) operations.
#[derive(Debug, Clone, Error)]
pub enum AdminError {
    /// `add` was called after `start`.
    #[error("cannot register member `{member}`: admin has already started")]
    RegistrationAfterStart { member: String },

    /// `start` was called twice.
    #[error("admin has already started")]
    AlreadyStarted,

    /// The admin reached its terminal state.
    #[error("admin is stopped")]
    Stopped,

    /// A member's `start` returned an error or faulted.
    #[error("member `{member}` failed to start: {source}")]
    MemberStartFailed { member: String, source: MemberError },
}

/// One entry of an aggregate shutdown error.
#[derive(Debug, Clone, Error)]
pub enum ShutdownFailure {
    #[error("member `{member}` failed to shut down: {source}")]
    MemberShutdownFailed { member: String, source: MemberError },

    #[error("member `{member}` did not shut down within {timeout:?}")]
    ShutdownTimeout { member: String, timeout: Duration },
}

impl ShutdownFailure {
    pub fn member(&self) -> &str {
        match self {
            ShutdownFailure::MemberShutdownFailed { member, .. } => member,
            ShutdownFailure::ShutdownTimeout { member, .. } => member,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ShutdownFailure::ShutdownTimeout { .. })
    }
}

/// Aggregate of every member that failed to stop or timed out.
#[derive(Debug, Clone)]
pub struct ShutdownError {
    failures: Vec<ShutdownFailure>,
}

impl ShutdownError {
    pub(crate) fn new(failures: Vec<ShutdownFailure>) -> Self {
        Self { failures }
    }

    /// Failures in registration order.
    pub fn failures(&self) -> &[ShutdownFailure] {
        &self.failures
    }

    /// Members that exceeded their shutdown deadline.
    pub fn timed_out(&self) -> impl Iterator<Item = &str> {
        self.failures
            .iter()
            .filter(|f| f.is_timeout())
            .map(ShutdownFailure::member)
    }
}

impl fmt::Display for ShutdownError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} member(s) failed to shut down: ", self.failures.len())?;
        for (i, failure) in self.failures.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", failure)?;
        }
        Ok(())
    }
}

impl StdError for ShutdownError {}
