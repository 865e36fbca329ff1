//! Saved chain presets
//!
//! The full preset list lives under one fixed key as a JSON array of
//! `{id, name, steps: [{id, label, duration}]}`. It is read once when the
//! store is opened and written back after every mutation.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::sequence::{new_id, Sequence};
use crate::store::{KeyValueStore, StoreError};

/// Storage key holding the preset list
pub const PRESETS_KEY: &str = "focus_presets";

/// A named chain sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    pub id: String,
    pub name: String,
    pub steps: Sequence,
}

/// Errors for preset operations
#[derive(Debug, thiserror::Error)]
pub enum PresetError {
    #[error("preset name must not be empty")]
    EmptyName,

    #[error("preset '{0}' not found")]
    NotFound(String),

    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Preset list backed by a key-value store
pub struct PresetStore {
    store: Box<dyn KeyValueStore>,
    presets: Vec<Preset>,
}

impl PresetStore {
    /// Open the store and read the preset list.
    ///
    /// Missing data means no presets. Malformed data is logged and treated
    /// as an empty list; it is overwritten by the next mutation.
    pub fn load(store: Box<dyn KeyValueStore>) -> Self {
        let presets = match store.get(PRESETS_KEY) {
            Ok(Some(json)) => match serde_json::from_str::<Vec<Preset>>(&json) {
                Ok(presets) => presets,
                Err(e) => {
                    warn!(error = %e, "stored presets are malformed; starting empty");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "could not read presets; starting empty");
                Vec::new()
            }
        };
        Self { store, presets }
    }

    pub fn list(&self) -> &[Preset] {
        &self.presets
    }

    pub fn get(&self, id: &str) -> Option<&Preset> {
        self.presets.iter().find(|p| p.id == id)
    }

    /// Look up by id, falling back to the first preset with that name
    pub fn find(&self, id_or_name: &str) -> Option<&Preset> {
        self.get(id_or_name)
            .or_else(|| self.presets.iter().find(|p| p.name == id_or_name))
    }

    /// Save `steps` under `name`. Duplicate names are allowed.
    pub fn save(&mut self, name: &str, steps: &Sequence) -> Result<Preset, PresetError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PresetError::EmptyName);
        }
        let preset = Preset {
            id: new_id(),
            name: name.to_string(),
            steps: steps.clone(),
        };
        self.presets.push(preset.clone());
        self.persist()?;
        info!(id = %preset.id, name = %preset.name, steps = preset.steps.len(), "preset saved");
        Ok(preset)
    }

    /// Rename a preset. Returns false when the new name is empty or the same
    /// as the current one.
    pub fn rename(&mut self, id: &str, name: &str) -> Result<bool, PresetError> {
        let name = name.trim();
        let preset = self
            .presets
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| PresetError::NotFound(id.to_string()))?;
        if name.is_empty() || preset.name == name {
            return Ok(false);
        }
        preset.name = name.to_string();
        self.persist()?;
        info!(id, name, "preset renamed");
        Ok(true)
    }

    /// Delete a preset. Unknown ids are ignored; returns whether one was
    /// removed.
    pub fn delete(&mut self, id: &str) -> Result<bool, PresetError> {
        let before = self.presets.len();
        self.presets.retain(|p| p.id != id);
        if self.presets.len() == before {
            return Ok(false);
        }
        self.persist()?;
        info!(id, "preset deleted");
        Ok(true)
    }

    /// Backing store, shared with other settings
    pub fn store_mut(&mut self) -> &mut dyn KeyValueStore {
        self.store.as_mut()
    }

    fn persist(&mut self) -> Result<(), PresetError> {
        let json = serde_json::to_string_pretty(&self.presets)?;
        self.store.set(PRESETS_KEY, &json)?;
        Ok(())
    }
}

impl std::fmt::Debug for PresetStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PresetStore")
            .field("presets", &self.presets)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MemoryStore;
    use crate::sequence::Step;

    fn steps(specs: &[(&str, u32)]) -> Sequence {
        Sequence::new(specs.iter().map(|(l, d)| Step::new(*l, *d)).collect()).unwrap()
    }

    #[test]
    fn test_load_empty_store() {
        let presets = PresetStore::load(Box::new(MemoryStore::new()));
        assert!(presets.list().is_empty());
    }

    #[test]
    fn test_load_malformed_is_empty() {
        let mut store = MemoryStore::new();
        store.set(PRESETS_KEY, "{not json").unwrap();
        let presets = PresetStore::load(Box::new(store));
        assert!(presets.list().is_empty());
    }

    #[test]
    fn test_load_rejects_preset_without_steps() {
        let mut store = MemoryStore::new();
        store
            .set(PRESETS_KEY, r#"[{"id":"1","name":"Empty","steps":[]}]"#)
            .unwrap();
        assert!(PresetStore::load(Box::new(store)).list().is_empty());
    }

    #[test]
    fn test_save_writes_through() {
        let store = MemoryStore::new();
        let mut presets = PresetStore::load(Box::new(store.clone()));
        let saved = presets.save("Morning", &steps(&[("Focus", 50), ("Break", 10)])).unwrap();

        let raw = store.get(PRESETS_KEY).unwrap().unwrap();
        let parsed: Vec<Preset> = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed, vec![saved]);
    }

    #[test]
    fn test_roundtrip_through_store() {
        let store = MemoryStore::new();
        let original = steps(&[("Write", 45), ("Walk", 15), ("Review", 20)]);
        let id = {
            let mut presets = PresetStore::load(Box::new(store.clone()));
            presets.save("Afternoon", &original).unwrap().id
        };

        let reopened = PresetStore::load(Box::new(store));
        assert_eq!(reopened.get(&id).unwrap().steps, original);
    }

    #[test]
    fn test_duplicate_names_allowed() {
        let mut presets = PresetStore::load(Box::new(MemoryStore::new()));
        let a = presets.save("Same", &steps(&[("A", 1)])).unwrap();
        let b = presets.save("Same", &steps(&[("B", 1)])).unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(presets.list().len(), 2);
        assert_eq!(presets.find("Same").unwrap().id, a.id);
    }

    #[test]
    fn test_empty_name_rejected() {
        let mut presets = PresetStore::load(Box::new(MemoryStore::new()));
        assert!(matches!(
            presets.save("   ", &steps(&[("A", 1)])),
            Err(PresetError::EmptyName)
        ));
    }

    #[test]
    fn test_rename() {
        let mut presets = PresetStore::load(Box::new(MemoryStore::new()));
        let p = presets.save("Old", &steps(&[("A", 1)])).unwrap();

        assert!(!presets.rename(&p.id, "Old").unwrap());
        assert!(!presets.rename(&p.id, "").unwrap());
        assert!(presets.rename(&p.id, "New").unwrap());
        assert_eq!(presets.get(&p.id).unwrap().name, "New");
        assert!(matches!(presets.rename("missing", "X"), Err(PresetError::NotFound(_))));
    }

    #[test]
    fn test_delete() {
        let store = MemoryStore::new();
        let mut presets = PresetStore::load(Box::new(store.clone()));
        let p = presets.save("Gone", &steps(&[("A", 1)])).unwrap();

        assert!(!presets.delete("missing").unwrap());
        assert!(presets.delete(&p.id).unwrap());
        assert!(presets.list().is_empty());
        assert_eq!(store.get(PRESETS_KEY).unwrap().as_deref().map(str::trim), Some("[]"));
    }

    #[test]
    fn test_reads_browser_format() {
        let mut store = MemoryStore::new();
        store
            .set(
                PRESETS_KEY,
                r#"[{"id":"1700000000000","name":"Classic","steps":[{"id":"1","label":"Focus","duration":25},{"id":"2","label":"Short Break","duration":5}]}]"#,
            )
            .unwrap();
        let presets = PresetStore::load(Box::new(store));
        let classic = presets.find("Classic").unwrap();
        assert_eq!(classic.steps.len(), 2);
        assert_eq!(classic.steps.steps()[1].label, "Short Break");
    }
}
