//! FocusChain - single and chained focus timers
//!
//! A countdown timer that runs either one session of configurable length or
//! a chain of labelled steps back to back, with a completion alert after
//! every step and named presets for reusable chains.

pub mod config;
pub mod controller;
pub mod display;
pub mod kernel;
pub mod mock;
pub mod notify;
pub mod preset;
pub mod sequence;
pub mod session;
pub mod signal;
pub mod state;
pub mod store;
pub mod tick;

pub use focuschain_protocol::{ControlCommand, TimerMode, APP_NAME};

pub use config::{EffectiveConfig, Settings};
pub use controller::{Capabilities, ControllerError, FocusController, Snapshot};
pub use kernel::{Effect, TimerKernel};
pub use notify::{Notifier, Permission, SoundPlayer};
pub use preset::{Preset, PresetStore};
pub use sequence::{Sequence, SequenceBuilder, Step, StepSpec};
pub use state::{Completion, KernelState};
pub use store::{FileStore, KeyValueStore};
pub use tick::{ThreadTickSource, TickSource};
