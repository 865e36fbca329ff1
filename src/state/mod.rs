//! Timer state machine states
//!
//! Kernel states: IDLE → RUNNING ⇄ PAUSED, with both RUNNING and PAUSED
//! returning to IDLE on completion or reset.

mod run_state;

pub use run_state::{Completion, RunState};

use serde::{Deserialize, Serialize};

use focuschain_protocol::Phase;

/// Kernel state enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KernelState {
    /// No active run
    Idle,
    /// A run exists and is ticking
    Running,
    /// A run exists but ticking is halted
    Paused,
}

impl KernelState {
    /// Check if transition from this state to target is valid
    pub fn can_transition_to(&self, target: KernelState) -> bool {
        match (self, target) {
            // From IDLE
            (KernelState::Idle, KernelState::Running) => true,

            // From RUNNING
            (KernelState::Running, KernelState::Paused) => true,
            (KernelState::Running, KernelState::Idle) => true,
            (KernelState::Running, KernelState::Running) => true, // restart

            // From PAUSED
            (KernelState::Paused, KernelState::Running) => true,
            (KernelState::Paused, KernelState::Idle) => true,

            // Reset while idle
            (KernelState::Idle, KernelState::Idle) => true,

            _ => false,
        }
    }

    /// Whether a run exists in this state
    pub fn has_run(&self) -> bool {
        !matches!(self, KernelState::Idle)
    }
}

impl std::fmt::Display for KernelState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            KernelState::Idle => "idle",
            KernelState::Running => "running",
            KernelState::Paused => "paused",
        };
        f.write_str(name)
    }
}

impl From<KernelState> for Phase {
    fn from(state: KernelState) -> Self {
        match state {
            KernelState::Idle => Phase::Idle,
            KernelState::Running => Phase::Running,
            KernelState::Paused => Phase::Paused,
        }
    }
}
