//! In-memory storage backend.

use dynablock_core::storage::{DocumentStorage, Result};
use parking_lot::RwLock;
use std::collections::HashMap;

/// Configuration for MemoryBackend.
#[derive(Debug, Clone, Default, serde::Deserialize, serde::Serialize)]
pub struct MemoryBackendConfig {
    /// Values to seed the table with, keyed by section then key.
    #[serde(default)]
    pub seed: HashMap<String, HashMap<String, String>>,
}

/// Document string storage that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    values: RwLock<HashMap<(String, String), String>>,
}

impl MemoryBackend {
    pub fn new(config: MemoryBackendConfig) -> Self {
        let values = config
            .seed
            .into_iter()
            .flat_map(|(section, entries)| {
                entries
                    .into_iter()
                    .map(move |(key, value)| ((section.clone(), key), value))
            })
            .collect();
        Self {
            values: RwLock::new(values),
        }
    }

    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }
}

impl DocumentStorage for MemoryBackend {
    fn get(&self, section: &str, key: &str) -> Result<Option<String>> {
        Ok(self
            .values
            .read()
            .get(&(section.to_string(), key.to_string()))
            .cloned())
    }

    fn set(&self, section: &str, key: &str, value: &str) -> Result<()> {
        self.values
            .write()
            .insert((section.to_string(), key.to_string()), value.to_string());
        Ok(())
    }

    fn is_persistent(&self) -> bool {
        false
    }
}
