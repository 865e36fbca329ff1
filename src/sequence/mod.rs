//! Steps, sequences, and the sequence builder
//!
//! A sequence is an ordered, non-empty list of labelled steps with durations
//! in whole minutes. Single mode synthesizes a one-step sequence; chain mode
//! uses the user-edited list.

mod builder;

pub use builder::{SequenceBuilder, SINGLE_MAX_MINUTES};

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Minimum duration for any step, in minutes
pub const MIN_DURATION_MINUTES: u32 = 1;

/// Identifier of the synthesized single-mode step
pub const SINGLE_STEP_ID: &str = "single";

/// Label of the synthesized single-mode step
pub const SINGLE_STEP_LABEL: &str = "Single Session";

/// Default label for steps appended in the builder
pub const NEW_STEP_LABEL: &str = "New Task";

/// Default duration for steps appended in the builder
pub const NEW_STEP_MINUTES: u32 = 25;

/// Errors for sequence construction
#[derive(Debug, thiserror::Error)]
pub enum SequenceError {
    #[error("a sequence needs at least one step")]
    Empty,

    #[error("invalid step '{0}': expected LABEL:MINUTES")]
    InvalidStepSpec(String),
}

/// A labelled countdown of whole minutes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub id: String,
    pub label: String,
    /// Duration in minutes (always >= 1 once built)
    pub duration: u32,
}

impl Step {
    /// Create a step with a fresh identifier
    pub fn new(label: impl Into<String>, duration: u32) -> Self {
        Self {
            id: new_id(),
            label: label.into(),
            duration: duration.max(MIN_DURATION_MINUTES),
        }
    }

    /// Duration in seconds
    pub fn duration_seconds(&self) -> u32 {
        self.duration.saturating_mul(60)
    }
}

/// Ordered, non-empty list of steps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Step>", into = "Vec<Step>")]
pub struct Sequence {
    steps: Vec<Step>,
}

impl Sequence {
    /// Build a sequence, rejecting an empty list.
    ///
    /// Durations below the minimum are clamped. Blank or repeated ids are
    /// replaced with fresh ones so every step can be addressed on its own.
    pub fn new(steps: Vec<Step>) -> Result<Self, SequenceError> {
        if steps.is_empty() {
            return Err(SequenceError::Empty);
        }
        let mut seen = HashSet::with_capacity(steps.len());
        let steps = steps
            .into_iter()
            .map(|mut s| {
                s.duration = s.duration.max(MIN_DURATION_MINUTES);
                if s.id.is_empty() || seen.contains(&s.id) {
                    s.id = new_id();
                }
                seen.insert(s.id.clone());
                s
            })
            .collect();
        Ok(Self { steps })
    }

    /// The one-step sequence used by single mode
    pub fn single(minutes: u32) -> Self {
        Self {
            steps: vec![Step {
                id: SINGLE_STEP_ID.to_string(),
                label: SINGLE_STEP_LABEL.to_string(),
                duration: minutes.max(MIN_DURATION_MINUTES),
            }],
        }
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Always false; kept for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn first(&self) -> &Step {
        &self.steps[0]
    }

    pub fn get(&self, index: usize) -> Option<&Step> {
        self.steps.get(index)
    }

    /// Sum of all step durations in minutes
    pub fn total_minutes(&self) -> u32 {
        self.steps.iter().map(|s| s.duration).sum()
    }

    pub(crate) fn steps_mut(&mut self) -> &mut Vec<Step> {
        &mut self.steps
    }
}

impl TryFrom<Vec<Step>> for Sequence {
    type Error = SequenceError;

    fn try_from(steps: Vec<Step>) -> Result<Self, Self::Error> {
        Self::new(steps)
    }
}

impl From<Sequence> for Vec<Step> {
    fn from(seq: Sequence) -> Self {
        seq.steps
    }
}

/// Parse a duration typed by the user.
///
/// Anything that is not a positive integer becomes the minimum duration.
pub fn parse_minutes(text: &str) -> u32 {
    text.trim()
        .parse::<i64>()
        .ok()
        .filter(|v| *v >= MIN_DURATION_MINUTES as i64)
        .map(|v| v.min(u32::MAX as i64) as u32)
        .unwrap_or(MIN_DURATION_MINUTES)
}

/// A `LABEL:MINUTES` step given on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepSpec {
    pub label: String,
    pub minutes: u32,
}

impl StepSpec {
    /// Parse `LABEL:MINUTES`. The split happens at the last colon so labels
    /// may contain colons. A bad minutes value falls back to the minimum.
    pub fn parse(spec: &str) -> Result<Self, SequenceError> {
        let (label, minutes) = spec
            .rsplit_once(':')
            .ok_or_else(|| SequenceError::InvalidStepSpec(spec.to_string()))?;
        let label = label.trim();
        if label.is_empty() {
            return Err(SequenceError::InvalidStepSpec(spec.to_string()));
        }
        Ok(Self {
            label: label.to_string(),
            minutes: parse_minutes(minutes),
        })
    }

    pub fn into_step(self) -> Step {
        Step::new(self.label, self.minutes)
    }
}

impl std::str::FromStr for StepSpec {
    type Err = SequenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Generate a fresh identifier for steps and presets
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
