//! Shutdown orchestration.
//!
//! # Responsibilities
//! - Stop accepting member starts and cancel every start context
//! - Call shutdown on each member whose start was invoked
//! - Bound every member shutdown by a deadline and aggregate failures
//!
//! # Design Decisions
//! - The sequence runs once, on its own task; every caller awaits the same
//!   shared result, so dropping a caller never cuts the sequence short
//! - Member shutdowns run concurrently, results keep registration order
//! - A member that misses its deadline has its context cancelled and its
//!   task aborted

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use futures_util::future::{join_all, BoxFuture, Shared};
use futures_util::FutureExt;
use tokio_util::sync::CancellationToken;

use crate::delegate::Delegate;
use crate::error::{ShutdownError, ShutdownFailure};
use crate::lifecycle::admin::{lock, LifeAdmin, Registry};
use crate::lifecycle::member::Member;
use crate::lifecycle::state::RunState;
use crate::observability::metrics;

/// Result of the one shutdown sequence, awaitable by any number of callers.
pub(super) type SharedOutcome = Shared<BoxFuture<'static, Result<(), ShutdownError>>>;

impl LifeAdmin {
    /// Shut down every started member using the configured timeout.
    pub async fn shutdown(&self) -> Result<(), ShutdownError> {
        self.shutdown_within(self.config.shutdown_timeout()).await
    }

    /// Shut down every started member, giving each at most `timeout`.
    ///
    /// Idempotent: later and concurrent calls wait for and return the
    /// first call's result without touching any member again. The first
    /// call's `timeout` applies.
    pub async fn shutdown_within(&self, timeout: Duration) -> Result<(), ShutdownError> {
        let outcome = self
            .outcome
            .get_or_init(|| {
                let drain = Drain {
                    registry: self.registry.clone(),
                    stop: self.stop.clone(),
                    delegate: self.delegate.clone(),
                };
                let outcome = drain.run(timeout).boxed().shared();
                tokio::spawn(outcome.clone());
                outcome
            })
            .clone();
        outcome.await
    }
}

/// Owned view of the admin needed by the shutdown task.
struct Drain {
    registry: Arc<Mutex<Registry>>,
    stop: CancellationToken,
    delegate: Delegate,
}

impl Drain {
    async fn run(self, timeout: Duration) -> Result<(), ShutdownError> {
        let (previous, started) = {
            let mut registry = lock(&self.registry);
            let previous = registry.state;
            registry.state = match previous {
                RunState::Idle => RunState::Stopped,
                RunState::Starting | RunState::Running => RunState::ShuttingDown,
                other => other,
            };
            (previous, registry.started())
        };
        self.stop.cancel();

        if previous == RunState::Idle {
            tracing::info!("Shutdown before start, admin stopped");
            return Ok(());
        }

        tracing::info!(
            members = started.len(),
            timeout_ms = timeout.as_millis() as u64,
            "Shutting down members"
        );

        let began = Instant::now();
        let results = join_all(
            started
                .into_iter()
                .map(|member| self.stop_member(member, timeout)),
        )
        .await;
        let failures: Vec<ShutdownFailure> = results.into_iter().flatten().collect();

        lock(&self.registry).state = RunState::Stopped;
        metrics::set_members_started(0);
        metrics::record_shutdown_duration(began.elapsed());

        if failures.is_empty() {
            tracing::info!(elapsed_ms = began.elapsed().as_millis() as u64, "Shutdown complete");
            Ok(())
        } else {
            let err = ShutdownError::new(failures);
            tracing::warn!(error = %err, "Shutdown completed with failures");
            Err(err)
        }
    }

    async fn stop_member(&self, member: Member, timeout: Duration) -> Option<ShutdownFailure> {
        let name = member.name().to_string();
        let service = member.service();
        let ctx = CancellationToken::new();

        // `ctx` is fresh, so only a bounded delegate could refuse the spawn.
        let joined = match self
            .delegate
            .spawn(&ctx, move |ctx| async move { service.shutdown(ctx).await })
            .await
        {
            Ok(handle) => {
                let abort = handle.abort_handle();
                match tokio::time::timeout(timeout, handle.join()).await {
                    Ok(joined) => joined,
                    Err(_) => {
                        ctx.cancel();
                        abort.abort();
                        tracing::warn!(
                            member = %name,
                            timeout_ms = timeout.as_millis() as u64,
                            "Member shutdown timed out"
                        );
                        metrics::record_member_shutdown(&name, "timeout");
                        return Some(ShutdownFailure::ShutdownTimeout { member: name, timeout });
                    }
                }
            }
            Err(refused) => Err(refused),
        };

        match joined {
            Ok(()) => {
                tracing::debug!(member = %name, "Member stopped");
                metrics::record_member_shutdown(&name, "ok");
                None
            }
            Err(source) => {
                tracing::warn!(member = %name, error = %source, "Member failed to shut down");
                metrics::record_member_shutdown(&name, "failed");
                Some(ShutdownFailure::MemberShutdownFailed { member: name, source })
            }
        }
    }
}
