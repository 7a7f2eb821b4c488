//! Member definitions.
//!
//! A member is any long-running component that exposes a start and a
//! shutdown operation. The admin treats it as opaque.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::BoxError;

/// Start/shutdown pair implemented by a long-running component.
///
/// `start` is expected to run for the component's operational lifetime and
/// return once `ctx` is cancelled or the component stops on its own.
#[async_trait]
pub trait Service: Send + Sync + 'static {
    async fn start(&self, ctx: CancellationToken) -> Result<(), BoxError>;

    /// Release resources. `ctx` is cancelled when the shutdown deadline
    /// elapses.
    async fn shutdown(&self, ctx: CancellationToken) -> Result<(), BoxError>;
}

/// A named member registered with the admin.
#[derive(Clone)]
pub struct Member {
    name: String,
    service: Arc<dyn Service>,
}

impl Member {
    /// An empty name is replaced by `member-<index>` on registration.
    pub fn new(name: impl Into<String>, service: impl Service) -> Self {
        Self::from_arc(name, Arc::new(service))
    }

    pub fn from_arc(name: impl Into<String>, service: Arc<dyn Service>) -> Self {
        Self {
            name: name.into(),
            service,
        }
    }

    /// Build a member from two closures.
    ///
    /// ```ignore
    /// let member = Member::from_fns(
    ///     "worker",
    ///     |ctx| async move { ctx.cancelled().await; Ok(()) },
    ///     |_ctx| async { Ok(()) },
    /// );
    /// ```
    pub fn from_fns<S, SFut, D, DFut>(name: impl Into<String>, start: S, shutdown: D) -> Self
    where
        S: Fn(CancellationToken) -> SFut + Send + Sync + 'static,
        SFut: Future<Output = Result<(), BoxError>> + Send + 'static,
        D: Fn(CancellationToken) -> DFut + Send + Sync + 'static,
        DFut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        Self::new(name, FnService { start, shutdown })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn service(&self) -> Arc<dyn Service> {
        self.service.clone()
    }

    pub(crate) fn with_position(mut self, index: usize) -> Self {
        if self.name.is_empty() {
            self.name = format!("member-{}", index);
        }
        self
    }
}

impl fmt::Debug for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Member").field("name", &self.name).finish()
    }
}

struct FnService<S, D> {
    start: S,
    shutdown: D,
}

#[async_trait]
impl<S, SFut, D, DFut> Service for FnService<S, D>
where
    S: Fn(CancellationToken) -> SFut + Send + Sync + 'static,
    SFut: Future<Output = Result<(), BoxError>> + Send + 'static,
    D: Fn(CancellationToken) -> DFut + Send + Sync + 'static,
    DFut: Future<Output = Result<(), BoxError>> + Send + 'static,
{
    async fn start(&self, ctx: CancellationToken) -> Result<(), BoxError> {
        (self.start)(ctx).await
    }

    async fn shutdown(&self, ctx: CancellationToken) -> Result<(), BoxError> {
        (self.shutdown)(ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positional_name_only_when_empty() {
        let unnamed = Member::from_fns("", |_| async { Ok(()) }, |_| async { Ok(()) });
        assert_eq!(unnamed.with_position(3).name(), "member-3");

        let named = Member::from_fns("http", |_| async { Ok(()) }, |_| async { Ok(()) });
        assert_eq!(named.with_position(0).name(), "http");
    }

    #[tokio::test]
    async fn test_fn_service_forwards_context() {
        let member = Member::from_fns(
            "worker",
            |ctx: CancellationToken| async move {
                ctx.cancelled().await;
                Ok(())
            },
            |_| async { Err::<(), BoxError>("refused".into()) },
        );

        let ctx = CancellationToken::new();
        ctx.cancel();
        assert!(member.service().start(ctx.clone()).await.is_ok());
        let err = member.service().shutdown(ctx).await.unwrap_err();
        assert_eq!(err.to_string(), "refused");
    }
}
