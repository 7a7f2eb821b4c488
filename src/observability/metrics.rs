//! Metrics collection and exposition.
//!
//! # Metrics
//! - `lifecycle_member_starts_total` (counter): member starts invoked, by member
//! - `lifecycle_member_start_failures_total` (counter): start errors and faults
//! - `lifecycle_member_shutdowns_total` (counter): by member, outcome (ok, failed, timeout)
//! - `lifecycle_shutdown_duration_seconds` (histogram): full shutdown sequence
//! - `lifecycle_members_started` (gauge): members whose start was invoked
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus exporter with an HTTP scrape endpoint.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_member_start(member: &str) {
    counter!("lifecycle_member_starts_total", "member" => member.to_string()).increment(1);
}

pub fn record_member_start_failure(member: &str) {
    counter!("lifecycle_member_start_failures_total", "member" => member.to_string()).increment(1);
}

pub fn record_member_shutdown(member: &str, outcome: &'static str) {
    counter!(
        "lifecycle_member_shutdowns_total",
        "member" => member.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_shutdown_duration(elapsed: Duration) {
    histogram!("lifecycle_shutdown_duration_seconds").record(elapsed.as_secs_f64());
}

pub fn set_members_started(count: usize) {
    gauge!("lifecycle_members_started").set(count as f64);
}
