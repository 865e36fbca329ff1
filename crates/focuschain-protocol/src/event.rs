//! Events reported to a UI layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::mode::TimerMode;

/// Coarse timer phase as seen from the outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Idle,
    Running,
    Paused,
}

/// Everything a front end needs to draw the timer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    /// Mode currently being viewed/configured
    pub view_mode: TimerMode,

    /// Mode of the run in progress (None when idle)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_mode: Option<TimerMode>,

    pub phase: Phase,

    /// Seconds shown on the big clock for the viewed mode
    pub display_seconds: u32,

    /// `M:SS` rendering of `display_seconds`
    pub clock: String,

    /// "Focusing", the active step label, or "Ready"
    pub label: String,

    /// Index of the active step (None when idle)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_index: Option<usize>,

    /// Number of steps in the active run (None when idle)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_count: Option<usize>,

    pub progress_percent: f64,

    pub can_skip: bool,

    /// Set when a run is ticking in a mode other than the viewed one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_notice: Option<String>,

    pub title: String,
}

/// A finished step (or finished session).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionReport {
    pub mode: TimerMode,
    pub step_index: usize,
    pub label: String,
    /// True when this completion ended the whole run
    pub finished_sequence: bool,
    pub completed_at: DateTime<Utc>,
}

/// One configured chain step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepReport {
    pub id: String,
    pub label: String,
    /// Minutes
    pub duration: u32,
}

/// One saved preset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetReport {
    pub id: String,
    pub name: String,
    pub step_count: usize,
    pub total_minutes: u32,
}

/// The editable setup: both modes' configuration and the saved presets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetupReport {
    pub single_duration_minutes: u32,
    pub chain: Vec<StepReport>,
    pub presets: Vec<PresetReport>,
}

/// Outbound event, one JSON object per line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutboundEvent {
    Status(StatusReport),
    StepCompleted(CompletionReport),
    Setup(SetupReport),
    /// A command or input line was rejected; the session goes on.
    Error { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{decode_line, encode_line};

    #[test]
    fn test_step_completed_is_tagged() {
        let event = OutboundEvent::StepCompleted(CompletionReport {
            mode: TimerMode::Chain,
            step_index: 1,
            label: "Short Break".to_string(),
            finished_sequence: true,
            completed_at: Utc::now(),
        });
        let line = encode_line(&event).unwrap();
        assert!(line.starts_with(r#"{"type":"STEP_COMPLETED""#));
        assert!(line.contains(r#""label":"Short Break""#));

        let parsed: OutboundEvent = decode_line(&line).unwrap();
        assert_eq!(parsed, event);
    }

    #[test]
    fn test_setup_and_error_events() {
        let event = OutboundEvent::Setup(SetupReport {
            single_duration_minutes: 25,
            chain: vec![StepReport {
                id: "1".to_string(),
                label: "Focus".to_string(),
                duration: 25,
            }],
            presets: vec![],
        });
        let line = encode_line(&event).unwrap();
        assert!(line.starts_with(r#"{"type":"SETUP","single_duration_minutes":25"#));

        let line = encode_line(&OutboundEvent::Error {
            message: "preset not found".to_string(),
        })
        .unwrap();
        assert_eq!(line, r#"{"type":"ERROR","message":"preset not found"}"#);
    }

    #[test]
    fn test_idle_status_omits_run_fields() {
        let event = OutboundEvent::Status(StatusReport {
            view_mode: TimerMode::Single,
            active_mode: None,
            phase: Phase::Idle,
            display_seconds: 1500,
            clock: "25:00".to_string(),
            label: "Ready".to_string(),
            step_index: None,
            step_count: None,
            progress_percent: 0.0,
            can_skip: false,
            background_notice: None,
            title: "FocusChain".to_string(),
        });
        let line = encode_line(&event).unwrap();
        assert!(line.contains(r#""phase":"IDLE""#));
        assert!(!line.contains("active_mode"));
        assert!(!line.contains("step_index"));
    }
}
