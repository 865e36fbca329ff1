//! FocusChain Protocol Types
//!
//! Message types exchanged between the timer core and its collaborators:
//! - tick commands/events between the controller and the background tick source
//! - JSON-line control commands and status events for a UI layer

pub mod control;
pub mod error;
pub mod event;
pub mod mode;
pub mod tick;

pub use control::ControlCommand;
pub use error::ProtocolError;
pub use event::{
    CompletionReport, OutboundEvent, Phase, PresetReport, SetupReport, StatusReport, StepReport,
};
pub use mode::TimerMode;
pub use tick::{TickCommand, TickEvent};

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Application name used in notification titles and idle window titles.
pub const APP_NAME: &str = "FocusChain";

/// Encode a message as a single JSON line (without the trailing newline).
pub fn encode_line<T: Serialize>(message: &T) -> Result<String, ProtocolError> {
    Ok(serde_json::to_string(message)?)
}

/// Decode a single JSON line into a message.
///
/// Surrounding whitespace is ignored; blank lines are rejected.
pub fn decode_line<T: DeserializeOwned>(line: &str) -> Result<T, ProtocolError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err(ProtocolError::EmptyMessage);
    }
    Ok(serde_json::from_str(trimmed)?)
}
