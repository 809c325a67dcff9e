//! JSON file key/value backend
//!
//! The whole namespace is one JSON object. Every write rewrites the file
//! through a temporary sibling and a rename, so a batch lands all at once.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;

use super::{KeyValueStore, StoreError, StoredValue};

/// Key/value store persisted as a JSON file.
#[derive(Debug)]
pub struct FileKeyValueStore {
    path: PathBuf,
    data: RwLock<BTreeMap<String, StoredValue>>,
}

impl FileKeyValueStore {
    /// Open the store at `path`. A missing file is an empty store; the file
    /// and its parent directory are created on the first write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let data = match fs::read(&path) {
            Ok(bytes) if bytes.is_empty() => BTreeMap::new(),
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(StoreError::Read(format!("{}: {e}", path.display()))),
        };
        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, data: &BTreeMap<String, StoredValue>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| StoreError::Write(format!("{}: {e}", parent.display())))?;
            }
        }
        let bytes = serde_json::to_vec_pretty(data)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, bytes).map_err(|e| StoreError::Write(format!("{}: {e}", tmp.display())))?;
        fs::rename(&tmp, &self.path)
            .map_err(|e| StoreError::Write(format!("{}: {e}", self.path.display())))
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<StoredValue>, StoreError> {
        Ok(self.data.read().get(key).cloned())
    }

    fn write_batch(&self, writes: Vec<(&str, Option<StoredValue>)>) -> Result<(), StoreError> {
        let mut data = self.data.write();
        let mut next = data.clone();
        for (key, value) in writes {
            match value {
                Some(value) => {
                    next.insert(key.to_string(), value);
                }
                None => {
                    next.remove(key);
                }
            }
        }
        // Memory only changes once the file is on disk.
        self.persist(&next)?;
        *data = next;
        Ok(())
    }
}
