//! An in-progress run
//!
//! Holds the snapshot of the sequence being run and the index of the
//! active step. Remaining time lives in the kernel because it also carries
//! the idle display value.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use focuschain_protocol::CompletionReport;

use crate::sequence::{Sequence, Step};
use crate::TimerMode;

/// Run state data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunState {
    /// Mode the run was started in
    pub mode: TimerMode,

    /// Sequence snapshot taken at start
    pub sequence: Sequence,

    /// Index of the active step (always valid for `sequence`)
    pub active_step_index: usize,
}

impl RunState {
    /// Create a run positioned on the first step
    pub fn new(mode: TimerMode, sequence: Sequence) -> Self {
        Self {
            mode,
            sequence,
            active_step_index: 0,
        }
    }

    pub fn current_step(&self) -> &Step {
        // index is kept in bounds by `advance`
        &self.sequence.steps()[self.active_step_index]
    }

    /// Whether a chain run has a step after the active one
    pub fn has_next(&self) -> bool {
        self.mode == TimerMode::Chain && self.active_step_index + 1 < self.sequence.len()
    }

    /// Move to the next step. Returns the new step, or None if there is none.
    pub fn advance(&mut self) -> Option<&Step> {
        if !self.has_next() {
            return None;
        }
        self.active_step_index += 1;
        Some(self.current_step())
    }

    /// Build the completion record for the active step
    pub fn completion(&self, finished_sequence: bool) -> Completion {
        let step = self.current_step();
        Completion {
            mode: self.mode,
            step_index: self.active_step_index,
            step_id: step.id.clone(),
            label: step.label.clone(),
            finished_sequence,
            completed_at: Utc::now(),
        }
    }
}

/// A step that ran down to zero
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    pub mode: TimerMode,
    pub step_index: usize,
    pub step_id: String,
    pub label: String,
    /// True when this completion ended the run
    pub finished_sequence: bool,
    pub completed_at: DateTime<Utc>,
}

impl From<&Completion> for CompletionReport {
    fn from(c: &Completion) -> Self {
        CompletionReport {
            mode: c.mode,
            step_index: c.step_index,
            label: c.label.clone(),
            finished_sequence: c.finished_sequence,
            completed_at: c.completed_at,
        }
    }
}
