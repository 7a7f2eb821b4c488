//! Member registry and run state.

use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::config::LifecycleConfig;
use crate::delegate::Delegate;
use crate::error::AdminError;
use crate::lifecycle::member::Member;
use crate::lifecycle::shutdown::SharedOutcome;
use crate::lifecycle::state::RunState;
use crate::observability::metrics;

/// Coordinates start and shutdown of a group of members.
///
/// Share it behind an `Arc` so one task can block in
/// [`start`](LifeAdmin::start) while another requests
/// [`shutdown`](LifeAdmin::shutdown).
pub struct LifeAdmin {
    pub(super) config: LifecycleConfig,
    pub(super) registry: Arc<Mutex<Registry>>,
    /// Cancelled once shutdown begins; every member start context is a child.
    pub(super) stop: CancellationToken,
    pub(super) delegate: Delegate,
    /// Set by the first shutdown call.
    pub(super) outcome: OnceLock<SharedOutcome>,
}

pub(super) struct Registry {
    pub(super) state: RunState,
    pub(super) members: Vec<Member>,
    /// `invoked[i]` is set when member `i`'s start begins executing.
    pub(super) invoked: Vec<bool>,
}

impl Registry {
    /// Gate taken by a member task right before calling `start`.
    ///
    /// Returns false once shutdown has begun, in which case the member is
    /// never started and never shut down.
    pub(super) fn begin_start(&mut self, index: usize) -> bool {
        if !self.state.accepts_starts() {
            return false;
        }
        self.invoked[index] = true;

        let started = self.invoked.iter().filter(|i| **i).count();
        metrics::set_members_started(started);
        if self.state == RunState::Starting && started == self.members.len() {
            self.state = RunState::Running;
            tracing::info!(members = started, "All members started");
        }
        true
    }

    pub(super) fn was_invoked(&self, index: usize) -> bool {
        self.invoked.get(index).copied().unwrap_or(false)
    }

    /// Members whose start was invoked, in registration order.
    pub(super) fn started(&self) -> Vec<Member> {
        self.members
            .iter()
            .zip(&self.invoked)
            .filter(|(_, invoked)| **invoked)
            .map(|(member, _)| member.clone())
            .collect()
    }
}

pub(super) fn lock(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    // Member code never runs under this lock.
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

impl LifeAdmin {
    pub fn new(config: LifecycleConfig) -> Self {
        Self {
            config,
            registry: Arc::new(Mutex::new(Registry {
                state: RunState::Idle,
                members: Vec::new(),
                invoked: Vec::new(),
            })),
            stop: CancellationToken::new(),
            delegate: Delegate::unbounded(),
            outcome: OnceLock::new(),
        }
    }

    /// Register a member. Only valid while the admin is idle.
    pub fn add(&self, member: Member) -> Result<(), AdminError> {
        let mut registry = lock(&self.registry);
        if registry.state != RunState::Idle {
            tracing::warn!(
                member = %member.name(),
                state = %registry.state,
                "Rejected registration after start"
            );
            return Err(AdminError::RegistrationAfterStart {
                member: member.name().to_string(),
            });
        }

        let member = member.with_position(registry.members.len());
        tracing::debug!(member = %member.name(), "Member registered");
        registry.members.push(member);
        Ok(())
    }

    pub fn state(&self) -> RunState {
        lock(&self.registry).state
    }

    pub fn len(&self) -> usize {
        lock(&self.registry).members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registered member names in registration order.
    pub fn member_names(&self) -> Vec<String> {
        lock(&self.registry)
            .members
            .iter()
            .map(|m| m.name().to_string())
            .collect()
    }

    /// Token cancelled when shutdown begins.
    pub fn stop_token(&self) -> CancellationToken {
        self.stop.clone()
    }

    pub fn shutdown_timeout(&self) -> Duration {
        self.config.shutdown_timeout()
    }
}

impl Default for LifeAdmin {
    fn default() -> Self {
        Self::new(LifecycleConfig::default())
    }
}
