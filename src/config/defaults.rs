//! Built-in defaults (layer 1)

use serde::{Deserialize, Serialize};

use crate::notify::NotifierBackend;
use crate::tick::DEFAULT_TICK_INTERVAL;

/// One chain step as written in config files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainStepConfig {
    pub label: String,
    /// Minutes
    pub duration: u32,
}

/// Built-in default configuration values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltinDefaults {
    /// Single-mode duration in minutes (default: 25)
    pub single_duration_minutes: u32,

    /// Initial chain steps (default: Focus 25, Short Break 5)
    pub chain: Vec<ChainStepConfig>,

    /// Tick interval in milliseconds (default: 1000)
    pub tick_interval_ms: u64,

    /// Play the completion cue (default: true)
    pub sound: bool,

    /// Notification delivery (default: desktop)
    pub notifier: NotifierBackend,
}

impl Default for BuiltinDefaults {
    fn default() -> Self {
        Self {
            single_duration_minutes: 25,
            chain: vec![
                ChainStepConfig {
                    label: "Focus".to_string(),
                    duration: 25,
                },
                ChainStepConfig {
                    label: "Short Break".to_string(),
                    duration: 5,
                },
            ],
            tick_interval_ms: DEFAULT_TICK_INTERVAL.as_millis() as u64,
            sound: true,
            notifier: NotifierBackend::default(),
        }
    }
}

impl BuiltinDefaults {
    /// Convert to JSON Value for merging
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "single_duration_minutes": self.single_duration_minutes,
            "chain": self.chain,
            "tick_interval_ms": self.tick_interval_ms,
            "sound": self.sound,
            "notifier": self.notifier,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let defaults = BuiltinDefaults::default();
        assert_eq!(defaults.single_duration_minutes, 25);
        assert_eq!(defaults.chain.len(), 2);
        assert_eq!(defaults.chain[1].label, "Short Break");
        assert_eq!(defaults.tick_interval_ms, 1000);
        assert!(defaults.sound);
        assert_eq!(defaults.notifier, NotifierBackend::Desktop);
    }

    #[test]
    fn test_to_value() {
        let value = BuiltinDefaults::default().to_value();
        assert_eq!(value["single_duration_minutes"], 25);
        assert_eq!(value["chain"][0]["label"], "Focus");
        assert_eq!(value["chain"][0]["duration"], 25);
        assert_eq!(value["notifier"], "desktop");
        assert!(value.get("notification_command").is_none());
    }
}
