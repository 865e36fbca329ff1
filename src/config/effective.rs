//! Effective configuration with provenance
//!
//! Captures the merged configuration plus where each layer came from, and
//! turns it into typed `Settings`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use super::defaults::{BuiltinDefaults, ChainStepConfig};
use super::merge::merge_layers;
use crate::notify::NotifierBackend;
use crate::sequence::{Sequence, SequenceBuilder, Step, SINGLE_MAX_MINUTES};

/// Upper bound for the tick interval in milliseconds
const MAX_TICK_INTERVAL_MS: u64 = 60_000;

/// Origin of a configuration source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ConfigOrigin {
    Builtin,
    User,
    Cli,
}

/// A contributing config source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSource {
    pub origin: ConfigOrigin,

    /// File path (None for builtin/cli)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Merged configuration with provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveConfig {
    /// When this config was computed
    pub created_at: DateTime<Utc>,

    /// The merged configuration object
    pub config: Value,

    /// Contributing sources in precedence order
    pub sources: Vec<ConfigSource>,
}

/// Typed view of the merged configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub single_duration_minutes: u32,

    pub chain: Vec<ChainStepConfig>,

    pub tick_interval_ms: u64,

    pub sound: bool,

    #[serde(default)]
    pub notifier: NotifierBackend,

    /// Where presets and the permission answer are stored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    /// Program (and leading args) run for system notifications
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_command: Option<Vec<String>>,
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("HOME is not set; pass --config and --data-dir explicitly")]
    NoHome,
}

/// `~/.config/focuschain/config.toml`
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    Ok(default_data_dir()?.join("config.toml"))
}

/// `~/.config/focuschain`
pub fn default_data_dir() -> Result<PathBuf, ConfigError> {
    let home = std::env::var("HOME").map_err(|_| ConfigError::NoHome)?;
    Ok(PathBuf::from(home).join(".config/focuschain"))
}

impl EffectiveConfig {
    /// Build effective config from layers. A missing user file is skipped.
    pub fn build(user_config_path: Option<&Path>, cli_overrides: Option<Value>) -> Result<Self, ConfigError> {
        let mut layers = Vec::new();
        let mut sources = Vec::new();

        // Layer 1: Built-in defaults
        layers.push(BuiltinDefaults::default().to_value());
        sources.push(ConfigSource {
            origin: ConfigOrigin::Builtin,
            path: None,
        });

        // Layer 2: User config
        if let Some(path) = user_config_path {
            if path.exists() {
                layers.push(Self::load_toml_file(path)?);
                sources.push(ConfigSource {
                    origin: ConfigOrigin::User,
                    path: Some(path.to_string_lossy().to_string()),
                });
            }
        }

        // Layer 3: CLI overrides
        if let Some(cli) = cli_overrides {
            layers.push(cli);
            sources.push(ConfigSource {
                origin: ConfigOrigin::Cli,
                path: None,
            });
        }

        let merged = merge_layers(layers);
        let config = Self {
            created_at: Utc::now(),
            config: merged,
            sources,
        };
        config.settings()?;
        Ok(config)
    }

    /// Deserialize and validate the merged values
    pub fn settings(&self) -> Result<Settings, ConfigError> {
        let settings: Settings = serde_json::from_value(self.config.clone())
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    fn load_toml_file(path: &Path) -> Result<Value, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        let toml_value: toml::Value = toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(format!("TOML parse error: {}", e)))?;
        Ok(Self::toml_to_json(toml_value))
    }

    fn toml_to_json(toml: toml::Value) -> Value {
        match toml {
            toml::Value::String(s) => Value::String(s),
            toml::Value::Integer(i) => Value::Number(i.into()),
            toml::Value::Float(f) => serde_json::Number::from_f64(f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            toml::Value::Boolean(b) => Value::Bool(b),
            toml::Value::Datetime(dt) => Value::String(dt.to_string()),
            toml::Value::Array(arr) => Value::Array(arr.into_iter().map(Self::toml_to_json).collect()),
            toml::Value::Table(table) => Value::Object(
                table
                    .into_iter()
                    .map(|(k, v)| (k, Self::toml_to_json(v)))
                    .collect(),
            ),
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.single_duration_minutes == 0 || self.single_duration_minutes > SINGLE_MAX_MINUTES {
            return Err(ConfigError::ValidationError(format!(
                "single_duration_minutes must be in [1, {}]",
                SINGLE_MAX_MINUTES
            )));
        }

        if self.chain.is_empty() {
            return Err(ConfigError::ValidationError(
                "chain must contain at least one step".to_string(),
            ));
        }
        if let Some(step) = self.chain.iter().find(|s| s.duration == 0) {
            return Err(ConfigError::ValidationError(format!(
                "chain step '{}' must last at least 1 minute",
                step.label
            )));
        }

        if self.tick_interval_ms == 0 || self.tick_interval_ms > MAX_TICK_INTERVAL_MS {
            return Err(ConfigError::ValidationError(format!(
                "tick_interval_ms must be in (0, {}]",
                MAX_TICK_INTERVAL_MS
            )));
        }

        if matches!(&self.notification_command, Some(argv) if argv.is_empty()) {
            return Err(ConfigError::ValidationError(
                "notification_command must name a program".to_string(),
            ));
        }
        if self.notifier == NotifierBackend::Command && self.notification_command.is_none() {
            return Err(ConfigError::ValidationError(
                "notifier = \"command\" requires notification_command".to_string(),
            ));
        }

        Ok(())
    }

    /// Seed a sequence builder. Configured steps get ids "1", "2", ...
    pub fn builder(&self) -> Result<SequenceBuilder, ConfigError> {
        let steps = self
            .chain
            .iter()
            .enumerate()
            .map(|(i, s)| Step {
                id: (i + 1).to_string(),
                label: s.label.clone(),
                duration: s.duration,
            })
            .collect();
        let chain = Sequence::new(steps).map_err(|e| ConfigError::ValidationError(e.to_string()))?;
        Ok(SequenceBuilder::new(self.single_duration_minutes, chain))
    }

    /// Configured data directory, or the default under HOME
    pub fn data_dir(&self) -> Result<PathBuf, ConfigError> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => default_data_dir(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_build_with_defaults_only() {
        let config = EffectiveConfig::build(None, None).unwrap();
        assert_eq!(config.sources.len(), 1);
        assert_eq!(config.sources[0].origin, ConfigOrigin::Builtin);

        let settings = config.settings().unwrap();
        assert_eq!(settings.single_duration_minutes, 25);
        assert_eq!(settings.tick_interval_ms, 1000);
        assert!(settings.notification_command.is_none());
        assert_eq!(settings.notifier, NotifierBackend::Desktop);
    }

    #[test]
    fn test_user_file_then_cli() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
single_duration_minutes = 50
notifier = "command"
notification_command = ["notify-send", "-u", "normal"]

[[chain]]
label = "Write"
duration = 45

[[chain]]
label = "Walk"
duration = 15
"#
        )
        .unwrap();

        let config = EffectiveConfig::build(
            Some(file.path()),
            Some(json!({"single_duration_minutes": 30})),
        )
        .unwrap();
        let origins: Vec<_> = config.sources.iter().map(|s| s.origin.clone()).collect();
        assert_eq!(origins, vec![ConfigOrigin::Builtin, ConfigOrigin::User, ConfigOrigin::Cli]);

        let settings = config.settings().unwrap();
        assert_eq!(settings.single_duration_minutes, 30);
        assert_eq!(settings.chain.len(), 2);
        assert_eq!(settings.chain[0].label, "Write");
        assert_eq!(settings.notifier, NotifierBackend::Command);
        assert_eq!(
            settings.notification_command,
            Some(vec!["notify-send".to_string(), "-u".to_string(), "normal".to_string()])
        );
    }

    #[test]
    fn test_missing_user_file_skipped() {
        let config =
            EffectiveConfig::build(Some(Path::new("/nonexistent/focuschain.toml")), None).unwrap();
        assert_eq!(config.sources.len(), 1);
    }

    #[test]
    fn test_invalid_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "single_duration_minutes = ").unwrap();
        assert!(matches!(
            EffectiveConfig::build(Some(file.path()), None),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_validation_errors() {
        for overrides in [
            json!({"single_duration_minutes": 0}),
            json!({"single_duration_minutes": 121}),
            json!({"chain": []}),
            json!({"chain": [{"label": "Zero", "duration": 0}]}),
            json!({"tick_interval_ms": 0}),
            json!({"notification_command": []}),
            json!({"notifier": "command"}),
        ] {
            let result = EffectiveConfig::build(None, Some(overrides.clone()));
            assert!(
                matches!(result, Err(ConfigError::ValidationError(_))),
                "expected validation error for {}",
                overrides
            );
        }
    }

    #[test]
    fn test_builder_from_settings() {
        let settings = EffectiveConfig::build(None, None).unwrap().settings().unwrap();
        let builder = settings.builder().unwrap();
        assert_eq!(builder, SequenceBuilder::default());
    }

    #[test]
    fn test_explicit_data_dir() {
        let config =
            EffectiveConfig::build(None, Some(json!({"data_dir": "/tmp/focus"}))).unwrap();
        assert_eq!(config.settings().unwrap().data_dir().unwrap(), PathBuf::from("/tmp/focus"));
    }
}
