//! Configuration merge system
//!
//! Implements the 3-layer configuration merge:
//! 1. Built-in defaults
//! 2. User config (~/.config/focuschain/config.toml)
//! 3. CLI flags

mod defaults;
mod effective;
mod merge;

pub use defaults::{BuiltinDefaults, ChainStepConfig};
pub use effective::{
    default_config_path, default_data_dir, ConfigError, ConfigOrigin, ConfigSource,
    EffectiveConfig, Settings,
};
pub use merge::{deep_merge, merge_layers};
