//! Test doubles for the controller's capabilities
//!
//! Each double is cheaply cloneable and shares its state between clones, so
//! a test can hand one clone to the controller and inspect the other.
//!
//! - `ManualTickSource`: records start/stop; tests deliver ticks themselves
//! - `RecordingNotifier`: records notifications, can fail on demand
//! - `RecordingPlayer`: counts cues played
//! - `MemoryStore`: in-memory key-value store

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::notify::{Cue, Notifier, NotifyError, Permission, SoundPlayer};
use crate::store::{KeyValueStore, StoreError};
use crate::tick::TickSource;

/// Tick source that never ticks on its own
#[derive(Debug, Clone, Default)]
pub struct ManualTickSource {
    state: Arc<Mutex<ManualTickState>>,
}

#[derive(Debug, Default)]
struct ManualTickState {
    active: bool,
    starts: usize,
    stops: usize,
}

impl ManualTickSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starts(&self) -> usize {
        self.state.lock().map(|s| s.starts).unwrap_or_default()
    }

    pub fn stops(&self) -> usize {
        self.state.lock().map(|s| s.stops).unwrap_or_default()
    }

    pub fn active(&self) -> bool {
        self.state.lock().map(|s| s.active).unwrap_or_default()
    }
}

impl TickSource for ManualTickSource {
    fn start(&mut self) {
        if let Ok(mut state) = self.state.lock() {
            state.active = true;
            state.starts += 1;
        }
    }

    fn stop(&mut self) {
        if let Ok(mut state) = self.state.lock() {
            state.active = false;
            state.stops += 1;
        }
    }

    fn is_active(&self) -> bool {
        self.active()
    }
}

/// Notifier that records what it was asked to show
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    state: Arc<Mutex<RecordingState>>,
}

#[derive(Debug, Default)]
struct RecordingState {
    permission: Permission,
    sent: Vec<(String, String)>,
    fail_next: bool,
}

impl RecordingNotifier {
    pub fn with_permission(permission: Permission) -> Self {
        let notifier = Self::default();
        if let Ok(mut state) = notifier.state.lock() {
            state.permission = permission;
        }
        notifier
    }

    /// (title, body) pairs in delivery order
    pub fn sent(&self) -> Vec<(String, String)> {
        self.state.lock().map(|s| s.sent.clone()).unwrap_or_default()
    }

    /// Bodies only, in delivery order
    pub fn bodies(&self) -> Vec<String> {
        self.sent().into_iter().map(|(_, body)| body).collect()
    }

    /// Make the next delivery fail
    pub fn fail_next(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.fail_next = true;
        }
    }
}

impl Notifier for RecordingNotifier {
    fn permission(&self) -> Permission {
        self.state.lock().map(|s| s.permission).unwrap_or_default()
    }

    fn set_permission(&mut self, permission: Permission) {
        if let Ok(mut state) = self.state.lock() {
            state.permission = permission;
        }
    }

    fn notify(&mut self, title: &str, body: &str) -> Result<(), NotifyError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| NotifyError::Io(std::io::Error::other("recorder poisoned")))?;
        if state.fail_next {
            state.fail_next = false;
            return Err(NotifyError::Io(std::io::Error::other("injected failure")));
        }
        state.sent.push((title.to_string(), body.to_string()));
        Ok(())
    }
}

/// Sound player that counts cues
#[derive(Debug, Clone, Default)]
pub struct RecordingPlayer {
    plays: Arc<Mutex<usize>>,
}

impl RecordingPlayer {
    pub fn plays(&self) -> usize {
        self.plays.lock().map(|p| *p).unwrap_or_default()
    }
}

impl SoundPlayer for RecordingPlayer {
    fn play(&mut self, _cue: &Cue) {
        if let Ok(mut plays) = self.plays.lock() {
            *plays += 1;
        }
    }
}

/// In-memory key-value store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .values
            .lock()
            .map(|v| v.get(key).cloned())
            .unwrap_or_default())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        if let Ok(mut values) = self.values.lock() {
            values.insert(key.to_string(), value.to_string());
        }
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        if let Ok(mut values) = self.values.lock() {
            values.remove(key);
        }
        Ok(())
    }
}
