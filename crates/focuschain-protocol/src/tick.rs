//! Tick source messages.
//!
//! The tick source accepts two commands and emits one event. None of them
//! carry a payload beyond the type tag.

use serde::{Deserialize, Serialize};

/// Command sent to the background tick source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TickCommand {
    /// Begin (or restart) emitting ticks.
    Start,
    /// Stop emitting ticks.
    Stop,
}

/// Event emitted by the tick source once per interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TickEvent {
    Tick,
}
