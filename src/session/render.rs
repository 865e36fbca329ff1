//! Status and completion output

use std::io::{self, Write};

use focuschain_protocol::{encode_line, OutboundEvent, SetupReport};

use super::SessionError;
use crate::controller::Snapshot;
use crate::state::Completion;

/// How the session writes to its output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// A single status line redrawn in place
    #[default]
    Human,
    /// One protocol message per line
    Json,
}

const CLEAR_LINE: &str = "\r\x1b[2K";

#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    format: OutputFormat,
}

impl Renderer {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn status<W: Write>(&self, out: &mut W, snapshot: &Snapshot) -> Result<(), SessionError> {
        match self.format {
            OutputFormat::Json => {
                let line = encode_line(&OutboundEvent::Status(snapshot.to_report()))?;
                writeln!(out, "{line}")?;
            }
            OutputFormat::Human => {
                // OSC 0 sets the terminal window title
                write!(out, "\x1b]0;{}\x07", printable(&snapshot.title))?;
                write!(out, "{CLEAR_LINE}{}", status_line(snapshot))?;
            }
        }
        out.flush()?;
        Ok(())
    }

    pub fn completions<W: Write>(
        &self,
        out: &mut W,
        completions: &[Completion],
    ) -> Result<(), SessionError> {
        for completion in completions {
            match self.format {
                OutputFormat::Json => {
                    let event = OutboundEvent::StepCompleted(completion.into());
                    writeln!(out, "{}", encode_line(&event)?)?;
                }
                OutputFormat::Human => {
                    let suffix = if completion.finished_sequence { " (done)" } else { "" };
                    writeln!(
                        out,
                        "{CLEAR_LINE}{} {} finished{suffix}",
                        completion.completed_at.format("%H:%M:%S"),
                        printable(&completion.label)
                    )?;
                }
            }
        }
        Ok(())
    }

    pub fn error<W: Write>(&self, out: &mut W, message: &str) -> Result<(), SessionError> {
        match self.format {
            OutputFormat::Json => {
                let event = OutboundEvent::Error {
                    message: message.to_string(),
                };
                writeln!(out, "{}", encode_line(&event)?)?;
            }
            OutputFormat::Human => {
                write!(out, "{CLEAR_LINE}")?;
                for line in message.lines() {
                    writeln!(out, "{}", printable(line))?;
                }
            }
        }
        out.flush()?;
        Ok(())
    }

    /// Both modes' configuration and the saved presets
    pub fn setup<W: Write>(&self, out: &mut W, setup: &SetupReport) -> Result<(), SessionError> {
        match self.format {
            OutputFormat::Json => {
                writeln!(out, "{}", encode_line(&OutboundEvent::Setup(setup.clone()))?)?;
            }
            OutputFormat::Human => {
                writeln!(out, "{CLEAR_LINE}single: {} min", setup.single_duration_minutes)?;
                writeln!(out, "chain:")?;
                for (i, step) in setup.chain.iter().enumerate() {
                    writeln!(
                        out,
                        "  {:>2}. {:<24} {:>3} min  [{}]",
                        i + 1,
                        printable(&step.label),
                        step.duration,
                        printable(&step.id)
                    )?;
                }
                if !setup.presets.is_empty() {
                    writeln!(out, "presets:")?;
                    for preset in &setup.presets {
                        writeln!(
                            out,
                            "  {:<24} {:>2} steps {:>4} min  [{}]",
                            printable(&preset.name),
                            preset.step_count,
                            preset.total_minutes,
                            printable(&preset.id)
                        )?;
                    }
                }
            }
        }
        out.flush()?;
        Ok(())
    }

    pub fn finish<W: Write>(&self, out: &mut W) -> io::Result<()> {
        if self.format == OutputFormat::Human {
            writeln!(out)?;
        }
        out.flush()
    }
}

/// Drop control characters so user text cannot emit terminal escapes
pub fn printable(text: &str) -> String {
    text.chars().filter(|c| !c.is_control()).collect()
}

/// Plain status line: clock, label, phase, step position, background notice.
///
/// Step position and progress belong to the run, so they only show while
/// the viewed mode is the running one.
pub fn status_line(snapshot: &Snapshot) -> String {
    let kernel = &snapshot.kernel;
    let mut line = format!(
        "{} {}  {}  [{}]",
        snapshot.view_mode,
        snapshot.clock,
        printable(&snapshot.label),
        kernel.state
    );
    let viewing_run = kernel.active_mode == Some(snapshot.view_mode);
    if viewing_run {
        if let (Some(index), Some(count)) = (kernel.active_step_index, kernel.step_count) {
            line.push_str(&format!("  step {}/{}", index + 1, count));
        }
        line.push_str(&format!("  {:.0}%", snapshot.progress_percent));
    }
    if let Some(notice) = &snapshot.background_notice {
        line.push_str(&format!("  ({notice})"));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::{Capabilities, FocusController};
    use crate::mock::{ManualTickSource, MemoryStore, RecordingNotifier, RecordingPlayer};
    use crate::sequence::SequenceBuilder;
    use crate::TimerMode;

    fn controller() -> FocusController {
        FocusController::new(
            SequenceBuilder::default(),
            TimerMode::Single,
            Capabilities {
                ticks: Box::new(ManualTickSource::new()),
                notifier: Box::new(RecordingNotifier::default()),
                sound: Box::new(RecordingPlayer::default()),
                store: Box::new(MemoryStore::new()),
            },
        )
    }

    #[test]
    fn test_idle_status_line() {
        let controller = controller();
        let line = status_line(&controller.snapshot());
        assert!(line.starts_with("SINGLE 25:00"));
        assert!(line.contains("Ready"));
        assert!(!line.contains('%'));
    }

    #[test]
    fn test_background_notice_in_line() {
        let mut controller = controller();
        controller.toggle();
        controller.set_view_mode(TimerMode::Chain);
        let line = status_line(&controller.snapshot());
        assert!(line.contains("Timer running in SINGLE mode"), "{line}");
    }

    #[test]
    fn test_background_run_hides_step_and_progress() {
        let mut controller = controller();
        controller.start(TimerMode::Chain);
        let line = status_line(&controller.snapshot());
        assert!(line.contains("step 1/2"), "{line}");

        controller.set_view_mode(TimerMode::Single);
        let line = status_line(&controller.snapshot());
        assert!(line.contains("Ready"), "{line}");
        assert!(!line.contains("step"), "{line}");
        assert!(!line.contains('%'), "{line}");
    }

    #[test]
    fn test_control_characters_stripped() {
        assert_eq!(printable("Focus\x1b]0;pwned\x07"), "Focus]0;pwned");

        let mut controller = controller();
        let id = controller.add_step();
        controller.set_step_label(&id, "Evil\x1b[2J");
        controller.remove_step("1");
        controller.remove_step("2");
        controller.start(TimerMode::Chain);

        let mut out = Vec::new();
        Renderer::new(OutputFormat::Human)
            .status(&mut out, &controller.snapshot())
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Evil[2J"), "{text:?}");
        assert!(!text.contains("\x1b[2J"), "{text:?}");
    }

    #[test]
    fn test_json_status_is_one_line() {
        let controller = controller();
        let mut out = Vec::new();
        Renderer::new(OutputFormat::Json)
            .status(&mut out, &controller.snapshot())
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.starts_with(r#"{"type":"STATUS""#));
    }
}
