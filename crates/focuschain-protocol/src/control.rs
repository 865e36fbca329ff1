//! Control commands sent by a UI layer.
//!
//! Each command is one JSON object per line, tagged by `type`.

use serde::{Deserialize, Serialize};

use crate::mode::TimerMode;

/// A user-facing control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlCommand {
    /// Start/pause button: pause a running timer, otherwise start or resume.
    Toggle,
    /// Start a fresh run. Without a mode, the viewed mode is used.
    Start {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mode: Option<TimerMode>,
    },
    Pause,
    Resume,
    Reset,
    /// Jump to the next chain step without a completion alert.
    Skip,
    /// Switch the viewed/configured mode.
    SetMode { mode: TimerMode },
    /// Set the single-mode duration in minutes.
    SetSingleDuration { minutes: u32 },
    /// Append a default step to the chain.
    AddStep,
    /// Remove a chain step. `id` may also be a 1-based position.
    RemoveStep { id: String },
    SetStepLabel { id: String, label: String },
    SetStepDuration { id: String, minutes: u32 },
    /// Save the current chain under `name`.
    SavePreset { name: String },
    /// Preset commands accept an id or a name.
    RenamePreset { id: String, name: String },
    DeletePreset { id: String },
    LoadPreset { id: String },
    /// Ask for the editable setup: both modes and the saved presets.
    List,
    AllowNotifications,
    DenyNotifications,
    Quit,
}

impl ControlCommand {
    /// Whether the command edits the configured steps or the presets
    pub fn edits_setup(&self) -> bool {
        matches!(
            self,
            Self::SetSingleDuration { .. }
                | Self::AddStep
                | Self::RemoveStep { .. }
                | Self::SetStepLabel { .. }
                | Self::SetStepDuration { .. }
                | Self::SavePreset { .. }
                | Self::RenamePreset { .. }
                | Self::DeletePreset { .. }
                | Self::LoadPreset { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode_line;

    #[test]
    fn test_start_without_mode() {
        let cmd: ControlCommand = decode_line(r#"{"type":"START"}"#).unwrap();
        assert_eq!(cmd, ControlCommand::Start { mode: None });
    }

    #[test]
    fn test_start_with_mode() {
        let cmd: ControlCommand = decode_line(r#"{"type":"START","mode":"CHAIN"}"#).unwrap();
        assert_eq!(cmd, ControlCommand::Start { mode: Some(TimerMode::Chain) });
    }

    #[test]
    fn test_set_mode_requires_mode() {
        assert!(decode_line::<ControlCommand>(r#"{"type":"SET_MODE"}"#).is_err());
        let cmd: ControlCommand = decode_line(r#"{"type":"SET_MODE","mode":"SINGLE"}"#).unwrap();
        assert_eq!(cmd, ControlCommand::SetMode { mode: TimerMode::Single });
    }

    #[test]
    fn test_editor_commands() {
        let cmd: ControlCommand =
            decode_line(r#"{"type":"SET_STEP_LABEL","id":"2","label":"Stretch"}"#).unwrap();
        assert_eq!(
            cmd,
            ControlCommand::SetStepLabel {
                id: "2".to_string(),
                label: "Stretch".to_string()
            }
        );
        assert!(cmd.edits_setup());

        let cmd: ControlCommand =
            decode_line(r#"{"type":"SET_SINGLE_DURATION","minutes":40}"#).unwrap();
        assert_eq!(cmd, ControlCommand::SetSingleDuration { minutes: 40 });
        assert!(decode_line::<ControlCommand>(r#"{"type":"SET_SINGLE_DURATION","minutes":-1}"#).is_err());

        let cmd: ControlCommand = decode_line(r#"{"type":"LOAD_PRESET","id":"Morning"}"#).unwrap();
        assert_eq!(cmd, ControlCommand::LoadPreset { id: "Morning".to_string() });
        assert!(!ControlCommand::List.edits_setup());
    }

    #[test]
    fn test_notification_commands() {
        let cmd: ControlCommand = decode_line(r#"{"type":"ALLOW_NOTIFICATIONS"}"#).unwrap();
        assert_eq!(cmd, ControlCommand::AllowNotifications);
    }
}
