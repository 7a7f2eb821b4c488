//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! lifecycle admin and delegate runner produce:
//!     → logging.rs (structured log events, member-scoped spans)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout via tracing-subscriber fmt layer
//!     → Prometheus scrape endpoint (optional)
//! ```

pub mod logging;
pub mod metrics;
