//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Registration (admin.rs):
//!     add(member) → registry (insertion order) while Idle
//!
//! Startup (startup.rs):
//!     start() → one delegate task per member → fan-in channel
//!     → first failure or shutdown request ends the start phase
//!
//! Shutdown (shutdown.rs):
//!     cancel start contexts → shutdown every invoked member concurrently
//!     → per-member deadline → aggregate failures → Stopped
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → admin.shutdown()
//! ```
//!
//! # Design Decisions
//! - No start ordering between members; every start runs concurrently
//! - A member's shutdown runs at most once, and only if its start was
//!   invoked, whatever the start's outcome
//! - Shutdown has a timeout: a member that overruns is reported, cancelled
//!   and aborted
//! - No restarts: a failed member stops the whole group

pub mod admin;
pub mod member;
pub mod shutdown;
pub mod signals;
pub mod startup;
pub mod state;

pub use admin::LifeAdmin;
pub use member::{Member, Service};
pub use signals::{shutdown_on_signal, wait_for_signal};
pub use state::RunState;
