//! Timer kernel
//!
//! The kernel owns the authoritative countdown and the active run. It never
//! touches the outside world: every operation returns the effects its owner
//! must apply (start/stop the tick source, raise a completion alert), in
//! order.
//!
//! The kernel distinguishes the mode of the run in progress from the mode
//! the user is viewing. Reset and sequence completion both fall back to the
//! *viewed* mode's first configured duration, so callers pass the view mode
//! and the builder to those operations.

use serde::Serialize;
use tracing::{debug, info};

use crate::sequence::SequenceBuilder;
use crate::state::{Completion, KernelState, RunState};
use crate::TimerMode;

/// Side effect requested by a kernel operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Start (or restart) the tick source
    StartTicking,
    /// Stop the tick source
    StopTicking,
    /// A step ran down to zero; alert the user
    StepCompleted(Completion),
}

/// Read-only view of the kernel
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KernelSnapshot {
    pub state: KernelState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_mode: Option<TimerMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_step_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_label: Option<String>,
    /// Full length of the active step in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_seconds: Option<u32>,
    pub remaining_seconds: u32,
    pub can_skip: bool,
}

/// Timer state machine
#[derive(Debug, Clone)]
pub struct TimerKernel {
    state: KernelState,
    run: Option<RunState>,
    remaining_seconds: u32,
}

impl TimerKernel {
    /// Create an idle kernel showing the viewed mode's first duration
    pub fn new(view_mode: TimerMode, builder: &SequenceBuilder) -> Self {
        Self {
            state: KernelState::Idle,
            run: None,
            remaining_seconds: idle_seconds(view_mode, builder),
        }
    }

    pub fn state(&self) -> KernelState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == KernelState::Running
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    pub fn run(&self) -> Option<&RunState> {
        self.run.as_ref()
    }

    pub fn active_mode(&self) -> Option<TimerMode> {
        self.run.as_ref().map(|r| r.mode)
    }

    /// Whether `skip` would do anything
    pub fn can_skip(&self) -> bool {
        self.run.as_ref().is_some_and(|r| r.has_next())
    }

    /// Start a fresh run of `mode` from the builder's current configuration.
    ///
    /// Any run in progress is discarded.
    pub fn start(&mut self, mode: TimerMode, builder: &SequenceBuilder) -> Vec<Effect> {
        let run = RunState::new(mode, builder.sequence_for(mode));
        self.remaining_seconds = run.current_step().duration_seconds();
        info!(
            mode = %mode,
            steps = run.sequence.len(),
            first = %run.current_step().label,
            "run started"
        );
        self.run = Some(run);
        self.transition(KernelState::Running);
        vec![Effect::StartTicking]
    }

    /// RUNNING → PAUSED. No-op in any other state.
    pub fn pause(&mut self) -> Vec<Effect> {
        if self.state != KernelState::Running {
            return Vec::new();
        }
        self.transition(KernelState::Paused);
        debug!(remaining = self.remaining_seconds, "paused");
        vec![Effect::StopTicking]
    }

    /// PAUSED → RUNNING. No-op in any other state.
    pub fn resume(&mut self) -> Vec<Effect> {
        if self.state != KernelState::Paused {
            return Vec::new();
        }
        self.transition(KernelState::Running);
        debug!(remaining = self.remaining_seconds, "resumed");
        vec![Effect::StartTicking]
    }

    /// Start/pause button.
    ///
    /// Pauses a running timer. Otherwise resumes the paused run when it
    /// belongs to the viewed mode, or starts a fresh run of the viewed mode.
    pub fn toggle(&mut self, view_mode: TimerMode, builder: &SequenceBuilder) -> Vec<Effect> {
        if self.state == KernelState::Running {
            return self.pause();
        }
        let resumable = self.state == KernelState::Paused
            && self.active_mode() == Some(view_mode)
            && self.remaining_seconds > 0;
        if resumable {
            self.resume()
        } else {
            self.start(view_mode, builder)
        }
    }

    /// One tick from the tick source.
    ///
    /// Ticks outside RUNNING are ignored; one may arrive after a stop.
    pub fn tick(&mut self, view_mode: TimerMode, builder: &SequenceBuilder) -> Vec<Effect> {
        if self.state != KernelState::Running {
            debug!(state = ?self.state, "tick ignored");
            return Vec::new();
        }
        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds > 0 {
            return Vec::new();
        }
        self.complete_step(view_mode, builder)
    }

    /// Advance to the next chain step without a completion alert.
    ///
    /// Only valid mid-chain; on the last step or outside chain mode this is
    /// a no-op. Returns whether the run advanced.
    pub fn skip(&mut self) -> bool {
        let Some(run) = self.run.as_mut() else {
            return false;
        };
        if run.advance().is_none() {
            return false;
        }
        let next = run.current_step();
        self.remaining_seconds = next.duration_seconds();
        info!(index = run.active_step_index, label = %next.label, "skipped to next step");
        true
    }

    /// Stop everything and show the viewed mode's first duration. Valid in
    /// any state.
    pub fn reset(&mut self, view_mode: TimerMode, builder: &SequenceBuilder) -> Vec<Effect> {
        self.transition(KernelState::Idle);
        self.run = None;
        self.remaining_seconds = idle_seconds(view_mode, builder);
        debug!(view_mode = %view_mode, remaining = self.remaining_seconds, "reset");
        vec![Effect::StopTicking]
    }

    /// While idle, refresh the displayed countdown from the configuration.
    pub fn sync_idle(&mut self, view_mode: TimerMode, builder: &SequenceBuilder) {
        if self.state == KernelState::Idle {
            self.remaining_seconds = idle_seconds(view_mode, builder);
        }
    }

    pub fn snapshot(&self) -> KernelSnapshot {
        let run = self.run.as_ref();
        KernelSnapshot {
            state: self.state,
            active_mode: run.map(|r| r.mode),
            active_step_index: run.map(|r| r.active_step_index),
            step_count: run.map(|r| r.sequence.len()),
            active_label: run.map(|r| r.current_step().label.clone()),
            step_seconds: run.map(|r| r.current_step().duration_seconds()),
            remaining_seconds: self.remaining_seconds,
            can_skip: self.can_skip(),
        }
    }

    fn complete_step(&mut self, view_mode: TimerMode, builder: &SequenceBuilder) -> Vec<Effect> {
        // Running always carries a run
        let Some(run) = self.run.as_mut() else {
            return Vec::new();
        };

        if run.has_next() {
            let completion = run.completion(false);
            run.advance();
            let next = run.current_step();
            self.remaining_seconds = next.duration_seconds();
            info!(
                finished = %completion.label,
                next = %next.label,
                index = run.active_step_index,
                "step finished"
            );
            return vec![Effect::StepCompleted(completion)];
        }

        let completion = run.completion(true);
        info!(mode = %run.mode, last = %completion.label, "run finished");
        self.transition(KernelState::Idle);
        self.run = None;
        self.remaining_seconds = idle_seconds(view_mode, builder);
        vec![Effect::StepCompleted(completion), Effect::StopTicking]
    }

    fn transition(&mut self, target: KernelState) {
        debug_assert!(
            self.state.can_transition_to(target),
            "invalid kernel transition {:?} -> {:?}",
            self.state,
            target
        );
        self.state = target;
    }
}

fn idle_seconds(view_mode: TimerMode, builder: &SequenceBuilder) -> u32 {
    builder.first_duration(view_mode).saturating_mul(60)
}
