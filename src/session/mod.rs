//! Interactive session loop
//!
//! One loop owns the controller and consumes every event from a single
//! channel in arrival order: ticks from the tick thread, parsed commands
//! from the input thread, and shutdown requests from the signal handler.
//! Nothing else touches timer state, so no locking is needed.

mod input;
mod render;

pub use input::{parse_command, spawn_input_thread, HELP};
pub use render::{OutputFormat, Renderer};

use std::io::{self, Write};
use std::sync::mpsc::Receiver;

use focuschain_protocol::{ControlCommand, ProtocolError, TickEvent};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::controller::{FocusController, Flow};

/// Everything the session loop reacts to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Tick,
    Command(ControlCommand),
    /// A line of input that did not parse
    InvalidInput(String),
    /// Standard input reached end of file
    InputClosed,
    Shutdown,
}

impl From<TickEvent> for SessionEvent {
    fn from(event: TickEvent) -> Self {
        match event {
            TickEvent::Tick => SessionEvent::Tick,
        }
    }
}

impl From<ControlCommand> for SessionEvent {
    fn from(command: ControlCommand) -> Self {
        SessionEvent::Command(command)
    }
}

/// Session options
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    pub format: OutputFormat,
    /// End the session when a run finishes
    pub exit_on_finish: bool,
}

/// Why the session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    Quit,
    Shutdown,
    InputClosed,
    Finished,
    /// Every event sender went away
    Disconnected,
}

/// Summary of a finished session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOutcome {
    pub reason: EndReason,
    /// Number of steps that ran down to zero
    pub completions: usize,
}

/// Session errors
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("output error: {0}")]
    Io(#[from] io::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

/// Run the event loop until quit, shutdown, or end of input.
///
/// The tick source is stopped before returning.
pub fn run_session<W: Write>(
    controller: &mut FocusController,
    events: &Receiver<SessionEvent>,
    out: &mut W,
    options: &SessionOptions,
) -> Result<SessionOutcome, SessionError> {
    let renderer = Renderer::new(options.format);
    let mut completions = 0;
    renderer.status(out, &controller.snapshot())?;

    let reason = loop {
        let Ok(event) = events.recv() else {
            break EndReason::Disconnected;
        };
        match event {
            SessionEvent::Tick => {
                let finished = controller.tick();
                completions += finished.len();
                renderer.completions(out, &finished)?;
                if options.exit_on_finish && finished.iter().any(|c| c.finished_sequence) {
                    renderer.status(out, &controller.snapshot())?;
                    break EndReason::Finished;
                }
            }
            SessionEvent::Command(ControlCommand::List) => {
                renderer.setup(out, &controller.setup_report())?;
                continue;
            }
            SessionEvent::Command(command) => {
                debug!(?command, "command");
                let edits_setup = command.edits_setup();
                match controller.handle(command) {
                    Ok(Flow::Quit) => break EndReason::Quit,
                    Ok(Flow::Continue) if edits_setup => {
                        renderer.setup(out, &controller.setup_report())?;
                    }
                    Ok(Flow::Continue) => {}
                    Err(e) => {
                        warn!(error = %e, "command rejected");
                        renderer.error(out, &e.to_string())?;
                    }
                }
            }
            SessionEvent::InvalidInput(message) => {
                renderer.error(out, &message)?;
                continue;
            }
            SessionEvent::InputClosed => {
                if options.exit_on_finish && controller.kernel().run().is_some() {
                    debug!("input closed; waiting for the run to finish");
                    continue;
                }
                break EndReason::InputClosed;
            }
            SessionEvent::Shutdown => break EndReason::Shutdown,
        }
        renderer.status(out, &controller.snapshot())?;
    };

    controller.shutdown();
    renderer.finish(out)?;
    info!(?reason, completions, "session ended");
    Ok(SessionOutcome { reason, completions })
}
