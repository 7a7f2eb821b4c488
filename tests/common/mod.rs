//! Fake members for lifecycle tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lifecycle_admin::lifecycle::RunState;
use lifecycle_admin::{BoxError, LifeAdmin, Member, Service};
use tokio_util::sync::CancellationToken;

/// How a fake member behaves when started.
#[allow(dead_code)]
#[derive(Debug, Clone, Copy)]
pub enum OnStart {
    /// Run until the start context is cancelled, then return `Ok`.
    Block,
    /// Return an error right away.
    Fail(&'static str),
    /// Wait, then return an error.
    FailAfter(Duration, &'static str),
    /// Panic right away.
    Panic,
    /// Return `Ok` right away.
    Finish,
    /// Return an error once the start context is cancelled.
    FailOnCancel(&'static str),
}

/// How a fake member behaves when shut down.
#[allow(dead_code)]
#[derive(Debug, Clone, Copy)]
pub enum OnShutdown {
    Succeed,
    Fail(&'static str),
    /// Sleep, ignoring the shutdown context.
    Sleep(Duration),
    /// Panic right away.
    Panic,
}

/// Call counters for one fake member.
#[derive(Debug, Default)]
pub struct Calls {
    starts: AtomicUsize,
    shutdowns: AtomicUsize,
}

#[allow(dead_code)]
impl Calls {
    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn shutdowns(&self) -> usize {
        self.shutdowns.load(Ordering::SeqCst)
    }
}

struct FakeService {
    calls: Arc<Calls>,
    on_start: OnStart,
    on_shutdown: OnShutdown,
}

#[async_trait]
impl Service for FakeService {
    async fn start(&self, ctx: CancellationToken) -> Result<(), BoxError> {
        self.calls.starts.fetch_add(1, Ordering::SeqCst);
        match self.on_start {
            OnStart::Block => {
                ctx.cancelled().await;
                Ok(())
            }
            OnStart::Fail(msg) => Err(msg.into()),
            OnStart::FailAfter(delay, msg) => {
                tokio::time::sleep(delay).await;
                Err(msg.into())
            }
            OnStart::Panic => panic!("member start panicked"),
            OnStart::Finish => Ok(()),
            OnStart::FailOnCancel(msg) => {
                ctx.cancelled().await;
                Err(msg.into())
            }
        }
    }

    async fn shutdown(&self, _ctx: CancellationToken) -> Result<(), BoxError> {
        self.calls.shutdowns.fetch_add(1, Ordering::SeqCst);
        match self.on_shutdown {
            OnShutdown::Succeed => Ok(()),
            OnShutdown::Fail(msg) => Err(msg.into()),
            OnShutdown::Sleep(delay) => {
                tokio::time::sleep(delay).await;
                Ok(())
            }
            OnShutdown::Panic => panic!("member shutdown panicked"),
        }
    }
}

/// Build a member and the counters it reports into.
pub fn fake_member(
    name: &str,
    on_start: OnStart,
    on_shutdown: OnShutdown,
) -> (Member, Arc<Calls>) {
    let calls = Arc::new(Calls::default());
    let member = Member::new(
        name,
        FakeService {
            calls: calls.clone(),
            on_start,
            on_shutdown,
        },
    );
    (member, calls)
}

/// Poll until the admin reaches `state`.
#[allow(dead_code)]
pub async fn wait_for_state(admin: &LifeAdmin, state: RunState) {
    for _ in 0..200 {
        if admin.state() == state {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("admin never reached {}, stuck in {}", state, admin.state());
}
