//! Connection State Store
//!
//! Persists which server the client is bound to across restarts, and the
//! durable application address. Values live in a flat key/value namespace
//! (the platform preferences on device, a JSON file or memory here).
//!
//! The persisted pair must satisfy `connected => address present`. Reads
//! check this and repair a violation by resetting before returning.

mod file;
mod local;
mod memory;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use file::FileKeyValueStore;
pub use local::LocalStore;
pub use memory::MemoryKeyValueStore;

use crate::address::ServerAddress;

/// Key holding the connected flag.
pub const KEY_SERVER_CONNECTED: &str = "isServerConnected";
/// Key holding the connected server address.
pub const KEY_CONNECTED_SERVER_ADDRESS: &str = "connectedServerAddress";
/// Key holding the durable application address.
pub const KEY_APPLICATION_ADDRESS: &str = "applicationAddress";

/// Key/value store failures.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading the backing storage failed
    #[error("failed to read store: {0}")]
    Read(String),

    /// Writing the backing storage failed
    #[error("failed to write store: {0}")]
    Write(String),

    /// Stored data could not be (de)serialized
    #[error("store data is corrupt: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A single stored value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredValue {
    /// Boolean preference
    Bool(bool),
    /// String preference
    String(String),
}

/// Flat preference namespace.
///
/// A key holding the wrong type reads as absent.
pub trait KeyValueStore: Send + Sync {
    /// Read a raw value.
    fn get(&self, key: &str) -> Result<Option<StoredValue>, StoreError>;

    /// Apply several writes at once; `None` removes the key.
    ///
    /// Implementations must make the whole batch visible together.
    fn write_batch(&self, writes: Vec<(&str, Option<StoredValue>)>) -> Result<(), StoreError>;

    /// Read a boolean. Missing reads as `false`.
    fn bool(&self, key: &str) -> Result<bool, StoreError> {
        Ok(matches!(self.get(key)?, Some(StoredValue::Bool(true))))
    }

    /// Read a string.
    fn string(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(match self.get(key)? {
            Some(StoredValue::String(s)) => Some(s),
            _ => None,
        })
    }

    /// Write a boolean.
    fn set_bool(&self, key: &str, value: bool) -> Result<(), StoreError> {
        self.write_batch(vec![(key, Some(StoredValue::Bool(value)))])
    }

    /// Write a string.
    fn set_string(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.write_batch(vec![(key, Some(StoredValue::String(value.to_string())))])
    }

    /// Remove a key.
    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.write_batch(vec![(key, None)])
    }
}

/// The persisted server binding.
///
/// The enum makes `connected` without an address unrepresentable once read.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub enum ConnectionRecord {
    /// No server binding
    #[default]
    Disconnected,
    /// Bound to a server
    Connected {
        /// The bound server
        server_address: ServerAddress,
    },
}

impl ConnectionRecord {
    /// Connected flag.
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected { .. })
    }

    /// Server address, present only when connected.
    pub fn server_address(&self) -> Option<&ServerAddress> {
        match self {
            Self::Connected { server_address } => Some(server_address),
            Self::Disconnected => None,
        }
    }
}

/// Persisted connection state.
pub trait ConnectionStateStore: Send + Sync {
    /// Read and validate the record. A persisted pair that breaks the
    /// invariant is reset and reported as disconnected.
    fn read(&self) -> Result<ConnectionRecord, StoreError>;

    /// Write both fields together.
    fn save(&self, record: &ConnectionRecord) -> Result<(), StoreError>;

    /// Clear both fields. Idempotent.
    fn reset(&self) -> Result<(), StoreError>;
}

/// Durable application address.
pub trait ApplicationAddressStore: Send + Sync {
    /// Stored address. An unparseable value is removed and reads as `None`.
    fn load_application_address(&self) -> Result<Option<ServerAddress>, StoreError>;

    /// Store the address.
    fn save_application_address(&self, address: &ServerAddress) -> Result<(), StoreError>;
}
