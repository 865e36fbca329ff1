//! Editable configuration for both timer modes
//!
//! The builder keeps the single-mode duration and the chain step list side
//! by side, independent of any run in progress. Runs take a snapshot via
//! `sequence_for`, so later edits never reach a running timer.

use crate::TimerMode;

use super::{
    new_id, Sequence, SequenceError, Step, MIN_DURATION_MINUTES, NEW_STEP_LABEL,
    NEW_STEP_MINUTES,
};

/// Upper bound for the single-mode duration, in minutes
pub const SINGLE_MAX_MINUTES: u32 = 120;

/// Builder state for single and chain mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceBuilder {
    single_duration: u32,
    chain: Sequence,
}

impl Default for SequenceBuilder {
    fn default() -> Self {
        let chain = Sequence::new(vec![
            Step {
                id: "1".to_string(),
                label: "Focus".to_string(),
                duration: 25,
            },
            Step {
                id: "2".to_string(),
                label: "Short Break".to_string(),
                duration: 5,
            },
        ])
        .unwrap_or_else(|_| Sequence::single(25));
        Self {
            single_duration: 25,
            chain,
        }
    }
}

impl SequenceBuilder {
    pub fn new(single_duration: u32, chain: Sequence) -> Self {
        Self {
            single_duration: clamp_single(single_duration),
            chain,
        }
    }

    pub fn single_duration(&self) -> u32 {
        self.single_duration
    }

    pub fn chain(&self) -> &Sequence {
        &self.chain
    }

    /// Snapshot of the sequence a run of `mode` would use
    pub fn sequence_for(&self, mode: TimerMode) -> Sequence {
        match mode {
            TimerMode::Single => Sequence::single(self.single_duration),
            TimerMode::Chain => self.chain.clone(),
        }
    }

    /// First configured duration of `mode`, in minutes
    pub fn first_duration(&self, mode: TimerMode) -> u32 {
        match mode {
            TimerMode::Single => self.single_duration,
            TimerMode::Chain => self.chain.first().duration,
        }
    }

    pub fn set_single_duration(&mut self, minutes: u32) {
        self.single_duration = clamp_single(minutes);
    }

    /// Append a default step and return its id
    pub fn add_step(&mut self) -> String {
        let id = new_id();
        self.chain.steps_mut().push(Step {
            id: id.clone(),
            label: NEW_STEP_LABEL.to_string(),
            duration: NEW_STEP_MINUTES,
        });
        id
    }

    /// Remove a step by id. Refuses to remove the last remaining step.
    pub fn remove_step(&mut self, id: &str) -> bool {
        let steps = self.chain.steps_mut();
        if steps.len() <= 1 {
            return false;
        }
        match steps.iter().position(|s| s.id == id) {
            Some(index) => {
                steps.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn set_step_label(&mut self, id: &str, label: impl Into<String>) -> bool {
        match self.step_mut(id) {
            Some(step) => {
                step.label = label.into();
                true
            }
            None => false,
        }
    }

    pub fn set_step_duration(&mut self, id: &str, minutes: u32) -> bool {
        match self.step_mut(id) {
            Some(step) => {
                step.duration = minutes.max(MIN_DURATION_MINUTES);
                true
            }
            None => false,
        }
    }

    /// Replace every chain step, e.g. when loading a preset
    pub fn replace_chain(&mut self, steps: Vec<Step>) -> Result<(), SequenceError> {
        self.chain = Sequence::new(steps)?;
        Ok(())
    }

    fn step_mut(&mut self, id: &str) -> Option<&mut Step> {
        self.chain.steps_mut().iter_mut().find(|s| s.id == id)
    }
}

fn clamp_single(minutes: u32) -> u32 {
    minutes.clamp(MIN_DURATION_MINUTES, SINGLE_MAX_MINUTES)
}
