//! lifecycle-admin demo process.
//!
//! Assembles two members under one admin:
//! - `tcp`: accepts connections on the configured address, greets and closes
//! - `heartbeat`: logs a tick at a fixed interval
//!
//! SIGINT/SIGTERM shuts both down within the configured timeout.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use clap::Parser;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use lifecycle_admin::config::{self, AppConfig};
use lifecycle_admin::lifecycle::{self, LifeAdmin, Member, Service};
use lifecycle_admin::observability::{logging, metrics};
use lifecycle_admin::BoxError;

#[derive(Parser)]
#[command(name = "lifecycle-admin")]
#[command(about = "Run a group of services under one lifecycle admin", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

/// Accept loop that greets each client and closes the connection.
struct TcpGreeter {
    address: String,
    stopped: Notify,
}

#[async_trait]
impl Service for TcpGreeter {
    async fn start(&self, ctx: CancellationToken) -> Result<(), BoxError> {
        let listener = TcpListener::bind(&self.address).await?;
        tracing::info!(address = %listener.local_addr()?, "Listening for connections");

        loop {
            tokio::select! {
                _ = ctx.cancelled() => break,
                _ = self.stopped.notified() => break,
                accepted = listener.accept() => {
                    let (mut socket, peer) = accepted?;
                    tracing::debug!(peer_addr = %peer, "Connection accepted");
                    tokio::spawn(async move {
                        let _ = socket.write_all(b"hello from lifecycle-admin\n").await;
                        let _ = socket.shutdown().await;
                    });
                }
            }
        }

        tracing::info!("Listener closed");
        Ok(())
    }

    async fn shutdown(&self, _ctx: CancellationToken) -> Result<(), BoxError> {
        self.stopped.notify_one();
        Ok(())
    }
}

/// Periodic worker.
struct Heartbeat {
    interval: Duration,
}

#[async_trait]
impl Service for Heartbeat {
    async fn start(&self, ctx: CancellationToken) -> Result<(), BoxError> {
        let mut ticker = tokio::time::interval(self.interval);
        let mut beats: u64 = 0;
        loop {
            tokio::select! {
                _ = ctx.cancelled() => break,
                _ = ticker.tick() => {
                    beats += 1;
                    tracing::debug!(beats, "Heartbeat");
                }
            }
        }
        tracing::info!(beats, "Heartbeat stopped");
        Ok(())
    }

    async fn shutdown(&self, _ctx: CancellationToken) -> Result<(), BoxError> {
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => AppConfig::default(),
    };

    logging::init(&config.observability)?;

    tracing::info!("lifecycle-admin v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        shutdown_timeout_ms = config.lifecycle.shutdown_timeout_ms,
        listen_address = %config.demo.listen_address,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics exporter");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let admin = Arc::new(LifeAdmin::new(config.lifecycle.clone()));
    admin.add(Member::new(
        "tcp",
        TcpGreeter {
            address: config.demo.listen_address.clone(),
            stopped: Notify::new(),
        },
    ))?;
    admin.add(Member::new(
        "heartbeat",
        Heartbeat {
            interval: Duration::from_millis(config.demo.heartbeat_interval_ms),
        },
    ))?;

    let signals = lifecycle::shutdown_on_signal(admin.clone());

    let started = admin.start().await;
    let stopped = signals.await?;

    if let Err(e) = &stopped {
        tracing::warn!(error = %e, "Shutdown reported failures");
    }
    started?;

    tracing::info!("Shutdown complete");
    Ok(())
}
