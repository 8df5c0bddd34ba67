//! Persistence boundary for the task collection.
//!
//! A [`KeyValueStore`] is the local synchronous medium (a JSON file on disk,
//! or a map in tests). [`SlotStore`] is the adapter the repository talks to:
//! it keeps the whole collection as one serialized blob under a named slot.

pub mod json_store;
pub mod memory_store;

pub use json_store::JsonFileStore;
pub use memory_store::MemoryStore;

use crate::error::AppError;
use crate::model::Task;
use tracing::{debug, warn};

/// Slot holding the serialized task collection.
pub const TASKS_SLOT: &str = "todos";

/// A local, synchronous key-value store holding string values.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, AppError>;

    /// Replaces any prior value stored under `key`.
    fn set(&mut self, key: &str, value: &str) -> Result<(), AppError>;
}

/// Loads and saves full snapshots of the task collection.
pub trait TaskStore {
    /// Never fails: an absent or unreadable snapshot yields an empty collection.
    fn load(&self) -> Vec<Task>;

    fn save(&mut self, tasks: &[Task]) -> Result<(), AppError>;
}

#[derive(Debug, Clone)]
pub struct SlotStore<K> {
    store: K,
    slot: String,
}

impl<K: KeyValueStore> SlotStore<K> {
    pub fn new(store: K) -> Self {
        Self::with_slot(store, TASKS_SLOT)
    }

    pub fn with_slot<S: Into<String>>(store: K, slot: S) -> Self {
        Self {
            store,
            slot: slot.into(),
        }
    }

    pub fn inner(&self) -> &K {
        &self.store
    }

    pub fn into_inner(self) -> K {
        self.store
    }
}

impl<K: KeyValueStore> TaskStore for SlotStore<K> {
    fn load(&self) -> Vec<Task> {
        let raw = match self.store.get(&self.slot) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(err) => {
                warn!(slot = %self.slot, error = %err, "task slot unreadable, starting empty");
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<Task>>(&raw) {
            Ok(tasks) => {
                debug!(slot = %self.slot, count = tasks.len(), "loaded tasks");
                tasks
            }
            Err(err) => {
                warn!(slot = %self.slot, error = %err, "task slot malformed, starting empty");
                Vec::new()
            }
        }
    }

    fn save(&mut self, tasks: &[Task]) -> Result<(), AppError> {
        let blob =
            serde_json::to_string(tasks).map_err(|err| AppError::invalid_data(err.to_string()))?;
        self.store.set(&self.slot, &blob)?;
        debug!(slot = %self.slot, count = tasks.len(), "saved tasks");
        Ok(())
    }
}
