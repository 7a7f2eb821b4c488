//! Admin run state.
//!
//! # State Transitions
//! ```text
//! Idle → Starting: start()
//! Starting → Running: every member's start invoked, none failed
//! Starting | Running → ShuttingDown: member failure or shutdown request
//! ShuttingDown → Stopped: every member shutdown finished or timed out
//! Idle → Stopped: shutdown() before start()
//! ```

use std::fmt;

/// Lifecycle state of a [`LifeAdmin`](super::LifeAdmin).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunState {
    Idle,
    Starting,
    Running,
    ShuttingDown,
    Stopped,
}

impl RunState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunState::Idle => "idle",
            RunState::Starting => "starting",
            RunState::Running => "running",
            RunState::ShuttingDown => "shutting_down",
            RunState::Stopped => "stopped",
        }
    }

    /// Member starts may still begin in this state.
    pub fn accepts_starts(&self) -> bool {
        matches!(self, RunState::Starting | RunState::Running)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Stopped)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
