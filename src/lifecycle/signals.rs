//! OS signal handling.
//!
//! # Responsibilities
//! - Wait for SIGTERM/SIGINT (ctrl-c on non-unix targets)
//! - Translate the first signal into an admin shutdown request
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - If handlers cannot be installed the listener only follows the admin's
//!   own stop, it never forces a shutdown

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::error::ShutdownError;
use crate::lifecycle::LifeAdmin;

/// Resolve with the name of the first termination signal received.
pub async fn wait_for_signal() -> std::io::Result<&'static str> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate = signal(SignalKind::terminate())?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result?;
                Ok("SIGINT")
            }
            _ = terminate.recv() => Ok("SIGTERM"),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        Ok("ctrl-c")
    }
}

/// Spawn a task that shuts `admin` down on the first termination signal.
///
/// The task also exits once the admin stops for any other reason, returning
/// the cached shutdown result.
pub fn shutdown_on_signal(admin: Arc<LifeAdmin>) -> JoinHandle<Result<(), ShutdownError>> {
    tokio::spawn(async move {
        let stop = admin.stop_token();
        tokio::select! {
            signal = wait_for_signal() => match signal {
                Ok(name) => tracing::info!(signal = name, "Shutdown signal received"),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to install signal handlers");
                    stop.cancelled().await;
                }
            },
            _ = stop.cancelled() => {
                tracing::debug!("Admin stopping, signal listener exiting");
            }
        }
        admin.shutdown().await
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_listener_exits_when_admin_stops() {
        let admin = Arc::new(LifeAdmin::default());
        let listener = shutdown_on_signal(admin.clone());

        admin.shutdown().await.unwrap();

        let result = tokio::time::timeout(Duration::from_secs(2), listener)
            .await
            .expect("listener should exit")
            .unwrap();
        assert!(result.is_ok());
    }
}
