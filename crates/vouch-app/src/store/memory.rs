//! In-memory key/value backend

use std::collections::BTreeMap;

use parking_lot::RwLock;

use super::{KeyValueStore, StoreError, StoredValue};

/// Key/value store kept in memory. Used by tests and the demo.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    data: RwLock<BTreeMap<String, StoredValue>>,
}

impl MemoryKeyValueStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with raw values, for setting up corrupt states in tests.
    pub fn with_values<I, K>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, StoredValue)>,
        K: Into<String>,
    {
        Self {
            data: RwLock::new(values.into_iter().map(|(k, v)| (k.into(), v)).collect()),
        }
    }

    /// Snapshot of every stored key.
    pub fn snapshot(&self) -> BTreeMap<String, StoredValue> {
        self.data.read().clone()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<StoredValue>, StoreError> {
        Ok(self.data.read().get(key).cloned())
    }

    fn write_batch(&self, writes: Vec<(&str, Option<StoredValue>)>) -> Result<(), StoreError> {
        let mut data = self.data.write();
        for (key, value) in writes {
            match value {
                Some(value) => {
                    data.insert(key.to_string(), value);
                }
                None => {
                    data.remove(key);
                }
            }
        }
        Ok(())
    }
}
