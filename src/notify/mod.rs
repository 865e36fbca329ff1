//! Completion alerts
//!
//! Every finished step plays a short two-tone cue. When the user has granted
//! permission, a system notification carrying the step label is raised as
//! well; without permission the notification is skipped and only the cue
//! plays.

mod bell;
mod command;
mod desktop;

pub use bell::TerminalBell;
pub use command::CommandNotifier;
pub use desktop::DesktopNotifier;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::str::FromStr;
use tracing::{debug, warn};

use focuschain_protocol::APP_NAME;

use crate::state::Completion;
use crate::store::{KeyValueStore, StoreError};

/// Storage key for the remembered notification permission
pub const PERMISSION_KEY: &str = "focus_notification_permission";

/// Label used when a finished step has an empty label
const FALLBACK_LABEL: &str = "Task";

/// Notification permission tri-state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    /// The user has not answered yet
    #[default]
    Default,
    Granted,
    Denied,
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => write!(f, "default"),
            Self::Granted => write!(f, "granted"),
            Self::Denied => write!(f, "denied"),
        }
    }
}

impl FromStr for Permission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "default" => Ok(Self::Default),
            "granted" => Ok(Self::Granted),
            "denied" => Ok(Self::Denied),
            other => Err(format!("unknown permission '{}'", other)),
        }
    }
}

/// Read the remembered permission. Missing or unreadable values mean
/// `Default`.
pub fn load_permission(store: &dyn KeyValueStore) -> Permission {
    match store.get(PERMISSION_KEY) {
        Ok(Some(value)) => value.parse().unwrap_or_else(|e| {
            warn!(error = %e, "ignoring stored notification permission");
            Permission::Default
        }),
        Ok(None) => Permission::Default,
        Err(e) => {
            warn!(error = %e, "could not read notification permission");
            Permission::Default
        }
    }
}

/// Remember the user's answer
pub fn save_permission(store: &mut dyn KeyValueStore, permission: Permission) -> Result<(), StoreError> {
    store.set(PERMISSION_KEY, &permission.to_string())
}

/// Errors raised while delivering a notification
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification command is empty")]
    EmptyCommand,

    #[error("notification delivery failed: {0}")]
    Io(#[from] io::Error),

    #[error("desktop notification failed: {0}")]
    Desktop(String),
}

/// Which notifier delivers completion notifications
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifierBackend {
    /// Platform notification service
    #[default]
    Desktop,
    /// The configured `notification_command`
    Command,
    /// A line on stderr
    Terminal,
}

impl fmt::Display for NotifierBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Desktop => write!(f, "desktop"),
            Self::Command => write!(f, "command"),
            Self::Terminal => write!(f, "terminal"),
        }
    }
}

/// Build the notifier for `backend`. `command` is only read by the
/// command backend.
pub fn notifier_for(
    backend: NotifierBackend,
    command: Option<Vec<String>>,
    permission: Permission,
) -> Box<dyn Notifier> {
    match backend {
        NotifierBackend::Desktop => Box::new(DesktopNotifier::new(permission)),
        NotifierBackend::Command => Box::new(CommandNotifier::new(command, permission)),
        NotifierBackend::Terminal => Box::new(CommandNotifier::new(None, permission)),
    }
}

/// Pick the cue player: the terminal bell, or silence when sound is off
pub fn sound_player(enabled: bool) -> Box<dyn SoundPlayer> {
    if enabled {
        Box::new(TerminalBell::new())
    } else {
        Box::new(SilentPlayer)
    }
}

/// System notification capability
pub trait Notifier: Send {
    fn permission(&self) -> Permission;

    fn set_permission(&mut self, permission: Permission);

    /// Deliver a notification. Callers check permission first.
    fn notify(&mut self, title: &str, body: &str) -> Result<(), NotifyError>;
}

/// Audio capability
pub trait SoundPlayer: Send {
    fn play(&mut self, cue: &Cue);
}

/// One tone of a cue
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub frequency_hz: f64,
    /// Start time relative to the cue start
    pub offset_ms: u64,
    pub duration_ms: u64,
}

/// A short sequence of tones
#[derive(Debug, Clone, PartialEq)]
pub struct Cue {
    pub tones: Vec<Tone>,
}

impl Cue {
    /// The completion "ping": C6 then E6, 50ms apart
    pub fn completion() -> Self {
        Self {
            tones: vec![
                Tone {
                    frequency_hz: 1046.50,
                    offset_ms: 0,
                    duration_ms: 400,
                },
                Tone {
                    frequency_hz: 1318.51,
                    offset_ms: 50,
                    duration_ms: 300,
                },
            ],
        }
    }
}

/// Sound player that stays quiet
#[derive(Debug, Default)]
pub struct SilentPlayer;

impl SoundPlayer for SilentPlayer {
    fn play(&mut self, _cue: &Cue) {}
}

/// Combines the cue and the notification for a finished step
pub struct CompletionAlert {
    notifier: Box<dyn Notifier>,
    sound: Box<dyn SoundPlayer>,
    cue: Cue,
}

impl CompletionAlert {
    pub fn new(notifier: Box<dyn Notifier>, sound: Box<dyn SoundPlayer>) -> Self {
        Self {
            notifier,
            sound,
            cue: Cue::completion(),
        }
    }

    pub fn permission(&self) -> Permission {
        self.notifier.permission()
    }

    pub fn set_permission(&mut self, permission: Permission) {
        self.notifier.set_permission(permission);
    }

    /// Play the cue and, if allowed, raise the notification.
    ///
    /// Delivery failures are logged; they never interrupt the timer.
    pub fn alert(&mut self, completion: &Completion) {
        self.sound.play(&self.cue);

        if self.notifier.permission() != Permission::Granted {
            debug!(label = %completion.label, "notification skipped without permission");
            return;
        }
        let body = notification_body(&completion.label);
        if let Err(e) = self.notifier.notify(APP_NAME, &body) {
            warn!(error = %e, "notification failed");
        }
    }
}

impl fmt::Debug for CompletionAlert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionAlert")
            .field("permission", &self.notifier.permission())
            .finish()
    }
}

/// Notification body for a finished step
pub fn notification_body(label: &str) -> String {
    let label = if label.trim().is_empty() { FALLBACK_LABEL } else { label };
    format!("{} finished.", label)
}
