//! Start orchestration.
//!
//! # Responsibilities
//! - Launch every member's start concurrently through the delegate runner
//! - Fan in start outcomes and track the first failure
//! - Hand over to shutdown on failure or on a shutdown request
//!
//! # Design Decisions
//! - A member start returning `Ok` means that member finished; it does not
//!   stop the group
//! - When a failure and a shutdown request race, the shutdown request wins
//!   the trigger; the failure is still recorded and returned
//! - Late start outcomes are awaited for at most the shutdown timeout, then
//!   the remaining start tasks are aborted

use std::collections::BTreeMap;

use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::error::{AdminError, MemberError};
use crate::lifecycle::admin::{lock, LifeAdmin};
use crate::lifecycle::state::RunState;
use crate::observability::metrics;

type StartReport = (usize, Result<(), MemberError>);

/// What ended the start phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    MemberFailed,
    ShutdownRequested,
}

/// Start outcomes collected so far.
struct Reports {
    pending: usize,
    failures: BTreeMap<usize, MemberError>,
}

impl Reports {
    fn new(members: usize) -> Self {
        Self {
            pending: members,
            failures: BTreeMap::new(),
        }
    }

    fn complete(&self) -> bool {
        self.pending == 0
    }

    /// Returns true if this report is a failure.
    fn record(&mut self, index: usize, result: Result<(), MemberError>) -> bool {
        self.pending = self.pending.saturating_sub(1);
        match result {
            Ok(()) | Err(MemberError::Cancelled) => false,
            Err(err) => {
                self.failures.entry(index).or_insert(err);
                true
            }
        }
    }

    /// Lowest registration index among recorded failures.
    fn first_failure(&mut self) -> Option<(usize, MemberError)> {
        self.failures.pop_first()
    }
}

impl LifeAdmin {
    /// Start every registered member and block until the group stops.
    ///
    /// Returns once a member fails (after shutting the group down) or once
    /// shutdown is requested and has completed. The error is the first
    /// member start failure, if any.
    pub async fn start(&self) -> Result<(), AdminError> {
        self.start_with(&CancellationToken::new()).await
    }

    /// Like [`start`](LifeAdmin::start); cancelling `external` is treated as
    /// a shutdown request.
    pub async fn start_with(&self, external: &CancellationToken) -> Result<(), AdminError> {
        let members = {
            let mut registry = lock(&self.registry);
            match registry.state {
                RunState::Idle => {}
                RunState::Stopped => return Err(AdminError::Stopped),
                _ => return Err(AdminError::AlreadyStarted),
            }
            registry.state = RunState::Starting;
            registry.invoked = vec![false; registry.members.len()];
            if registry.members.is_empty() {
                registry.state = RunState::Running;
            }
            registry.members.clone()
        };

        tracing::info!(members = members.len(), "Starting members");

        let (tx, mut rx) = mpsc::unbounded_channel::<StartReport>();
        let mut aborts: Vec<Option<AbortHandle>> = Vec::with_capacity(members.len());

        for (index, member) in members.iter().enumerate() {
            let name = member.name().to_string();
            let service = member.service();
            let registry = self.registry.clone();
            let span = tracing::info_span!("member", member = %name);

            let work = move |ctx: CancellationToken| {
                async move {
                    if !lock(&registry).begin_start(index) {
                        return Ok(());
                    }
                    tracing::debug!("Member start invoked");
                    metrics::record_member_start(&name);
                    service.start(ctx).await
                }
                .instrument(span)
            };

            match self.delegate.spawn(&self.stop.child_token(), work).await {
                Ok(handle) => {
                    aborts.push(Some(handle.abort_handle()));
                    let tx = tx.clone();
                    let registry = self.registry.clone();
                    tokio::spawn(async move {
                        let result = handle.join().await;
                        let result = if lock(&registry).was_invoked(index) {
                            result
                        } else {
                            Err(MemberError::Cancelled)
                        };
                        let _ = tx.send((index, result));
                    });
                }
                Err(err) => {
                    aborts.push(None);
                    let _ = tx.send((index, Err(err)));
                }
            }
        }
        drop(tx);

        let mut reports = Reports::new(members.len());
        let trigger = loop {
            tokio::select! {
                biased;
                _ = self.stop.cancelled() => break Trigger::ShutdownRequested,
                _ = external.cancelled() => break Trigger::ShutdownRequested,
                report = rx.recv(), if !reports.complete() => match report {
                    Some((index, result)) => {
                        if let Err(err) = &result {
                            if !err.is_cancelled() {
                                tracing::error!(
                                    member = %members[index].name(),
                                    error = %err,
                                    "Member failed to start"
                                );
                                metrics::record_member_start_failure(members[index].name());
                            }
                        }
                        if reports.record(index, result) {
                            break Trigger::MemberFailed;
                        }
                    }
                    None => reports.pending = 0,
                },
            }
        };

        // Failures that arrived together with the first one.
        while let Ok((index, result)) = rx.try_recv() {
            reports.record(index, result);
        }

        match trigger {
            Trigger::MemberFailed => tracing::warn!("Member failure, shutting down group"),
            Trigger::ShutdownRequested => tracing::info!("Shutdown requested while running"),
        }

        if let Err(err) = self.shutdown().await {
            tracing::warn!(error = %err, "Group shutdown reported failures");
        }

        let grace = tokio::time::sleep(self.config.shutdown_timeout());
        tokio::pin!(grace);
        while !reports.complete() {
            tokio::select! {
                report = rx.recv() => match report {
                    Some((index, result)) => {
                        if let Err(err) = &result {
                            if !err.is_cancelled() {
                                tracing::warn!(
                                    member = %members[index].name(),
                                    error = %err,
                                    "Member start returned an error after shutdown began"
                                );
                            }
                        }
                        reports.record(index, result);
                        aborts[index] = None;
                    }
                    None => break,
                },
                _ = &mut grace => {
                    for (index, abort) in aborts.iter().enumerate() {
                        if let Some(abort) = abort {
                            if !abort.is_finished() {
                                tracing::warn!(
                                    member = %members[index].name(),
                                    "Member start ignored cancellation, aborting"
                                );
                                abort.abort();
                            }
                        }
                    }
                    break;
                }
            }
        }

        match reports.first_failure() {
            Some((index, source)) => Err(AdminError::MemberStartFailed {
                member: members[index].name().to_string(),
                source,
            }),
            None => Ok(()),
        }
    }
}
