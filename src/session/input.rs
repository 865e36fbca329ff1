//! Line-based command input

use std::io::{self, BufRead};
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};

use focuschain_protocol::{decode_line, ControlCommand};
use tracing::{debug, warn};

use super::SessionEvent;
use crate::sequence::parse_minutes;
use crate::TimerMode;

/// Key reference printed for `?`
pub const HELP: &str = "\
timer:   p|space toggle  r reset  s skip  m single|chain switch mode
         start [single|chain]  pause  resume  allow  deny  q quit
edit:    d MINUTES single duration  a add step  rm STEP remove step
         label STEP TEXT  step STEP MINUTES  l list steps and presets
presets: save NAME  load PRESET  rename PRESET NAME  delete PRESET
         (STEP is an id or position, PRESET an id or name)";

/// Parse one line of input.
///
/// With `json` set the line must be a control protocol message. Blank lines
/// yield `Ok(None)`.
pub fn parse_command(line: &str, json: bool) -> Result<Option<ControlCommand>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    if json {
        return decode_line(line).map(Some).map_err(|e| e.to_string());
    }

    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, Some(rest.trim())),
        None => (line, None),
    };
    let head = head.to_ascii_lowercase();

    let command = match (head.as_str(), rest) {
        ("p" | "t" | "space" | "toggle", None) => ControlCommand::Toggle,
        ("start", None) => ControlCommand::Start { mode: None },
        ("start", Some(mode)) => ControlCommand::Start {
            mode: Some(mode.parse::<TimerMode>()?),
        },
        ("pause", None) => ControlCommand::Pause,
        ("resume", None) => ControlCommand::Resume,
        ("r" | "reset", None) => ControlCommand::Reset,
        ("s" | "skip", None) => ControlCommand::Skip,
        ("m" | "mode", Some(mode)) => ControlCommand::SetMode { mode: mode.parse()? },
        ("m" | "mode", None) => return Err("missing mode (single or chain)".to_string()),
        ("single", None) => ControlCommand::SetMode { mode: TimerMode::Single },
        ("chain", None) => ControlCommand::SetMode { mode: TimerMode::Chain },
        ("d" | "duration", Some(minutes)) => ControlCommand::SetSingleDuration {
            minutes: parse_minutes(minutes),
        },
        ("a" | "add", None) => ControlCommand::AddStep,
        ("rm" | "remove", Some(step)) => ControlCommand::RemoveStep { id: step.to_string() },
        ("label", Some(args)) => {
            let (id, label) = split_pair(args, "label STEP TEXT")?;
            ControlCommand::SetStepLabel { id, label }
        }
        ("step", Some(args)) => {
            let (id, minutes) = split_pair(args, "step STEP MINUTES")?;
            ControlCommand::SetStepDuration {
                id,
                minutes: parse_minutes(&minutes),
            }
        }
        ("save", Some(name)) => ControlCommand::SavePreset { name: name.to_string() },
        ("load", Some(preset)) => ControlCommand::LoadPreset { id: preset.to_string() },
        ("rename", Some(args)) => {
            let (id, name) = split_pair(args, "rename PRESET NAME")?;
            ControlCommand::RenamePreset { id, name }
        }
        ("delete", Some(preset)) => ControlCommand::DeletePreset { id: preset.to_string() },
        ("l" | "ls" | "list", None) => ControlCommand::List,
        ("allow", None) => ControlCommand::AllowNotifications,
        ("deny", None) => ControlCommand::DenyNotifications,
        ("q" | "quit" | "exit", None) => ControlCommand::Quit,
        ("?" | "h" | "help", None) => return Err(HELP.to_string()),
        (
            "d" | "duration" | "rm" | "remove" | "label" | "step" | "save" | "load" | "rename"
            | "delete",
            None,
        ) => return Err(format!("'{head}' needs an argument (? for help)")),
        _ => return Err(format!("unknown command '{line}' (? for help)")),
    };
    Ok(Some(command))
}

/// Split `FIRST REST...` where both parts are required
fn split_pair(args: &str, usage: &str) -> Result<(String, String), String> {
    args.split_once(char::is_whitespace)
        .map(|(first, rest)| (first.to_string(), rest.trim().to_string()))
        .filter(|(_, rest)| !rest.is_empty())
        .ok_or_else(|| format!("usage: {usage}"))
}

/// Read lines from `reader` on a background thread and forward them as
/// session events. Ends with [`SessionEvent::InputClosed`].
pub fn spawn_input_thread<R>(
    reader: R,
    json: bool,
    events: Sender<SessionEvent>,
) -> io::Result<JoinHandle<()>>
where
    R: BufRead + Send + 'static,
{
    thread::Builder::new()
        .name("focuschain-input".to_string())
        .spawn(move || {
            for line in reader.lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        warn!(error = %e, "input read failed");
                        break;
                    }
                };
                let event = match parse_command(&line, json) {
                    Ok(Some(command)) => SessionEvent::Command(command),
                    Ok(None) => continue,
                    Err(message) => {
                        debug!(%line, "rejected input");
                        SessionEvent::InvalidInput(message)
                    }
                };
                if events.send(event).is_err() {
                    return;
                }
            }
            let _ = events.send(SessionEvent::InputClosed);
        })
}
