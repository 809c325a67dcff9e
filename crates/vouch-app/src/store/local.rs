//! Connection state on top of a key/value backend

use parking_lot::Mutex;
use tracing::{debug, warn};

use super::{
    ApplicationAddressStore, ConnectionRecord, ConnectionStateStore, KeyValueStore, StoreError,
    StoredValue, KEY_APPLICATION_ADDRESS, KEY_CONNECTED_SERVER_ADDRESS, KEY_SERVER_CONNECTED,
};
use crate::address::ServerAddress;

/// Client preferences backed by a [`KeyValueStore`].
///
/// Pair reads and writes go through one lock so a reader never observes a
/// half-updated connection record.
pub struct LocalStore<K: KeyValueStore> {
    kv: K,
    pair_lock: Mutex<()>,
}

impl<K: KeyValueStore> LocalStore<K> {
    /// Wrap a backend.
    pub fn new(kv: K) -> Self {
        Self {
            kv,
            pair_lock: Mutex::new(()),
        }
    }

    /// The backend.
    pub fn backend(&self) -> &K {
        &self.kv
    }

    fn clear_pair(&self) -> Result<(), StoreError> {
        self.kv.write_batch(vec![
            (KEY_SERVER_CONNECTED, Some(StoredValue::Bool(false))),
            (KEY_CONNECTED_SERVER_ADDRESS, None),
        ])
    }
}

impl<K: KeyValueStore> ConnectionStateStore for LocalStore<K> {
    fn read(&self) -> Result<ConnectionRecord, StoreError> {
        let _guard = self.pair_lock.lock();
        let connected = self.kv.bool(KEY_SERVER_CONNECTED)?;
        let address = self.kv.string(KEY_CONNECTED_SERVER_ADDRESS)?;

        if !connected {
            if address.is_some() {
                debug!("stale server address without connected flag, treating as disconnected");
            }
            return Ok(ConnectionRecord::Disconnected);
        }

        match address.as_deref().map(ServerAddress::parse) {
            Some(Ok(server_address)) => Ok(ConnectionRecord::Connected { server_address }),
            Some(Err(e)) => {
                warn!(error = %e, "persisted server address is invalid, resetting connection state");
                self.clear_pair()?;
                Ok(ConnectionRecord::Disconnected)
            }
            None => {
                warn!("connected flag set without a server address, resetting connection state");
                self.clear_pair()?;
                Ok(ConnectionRecord::Disconnected)
            }
        }
    }

    fn save(&self, record: &ConnectionRecord) -> Result<(), StoreError> {
        let _guard = self.pair_lock.lock();
        match record {
            ConnectionRecord::Connected { server_address } => self.kv.write_batch(vec![
                (KEY_SERVER_CONNECTED, Some(StoredValue::Bool(true))),
                (
                    KEY_CONNECTED_SERVER_ADDRESS,
                    Some(StoredValue::String(server_address.as_str().to_string())),
                ),
            ]),
            ConnectionRecord::Disconnected => self.clear_pair(),
        }
    }

    fn reset(&self) -> Result<(), StoreError> {
        let _guard = self.pair_lock.lock();
        self.clear_pair()
    }
}

impl<K: KeyValueStore> ApplicationAddressStore for LocalStore<K> {
    fn load_application_address(&self) -> Result<Option<ServerAddress>, StoreError> {
        let Some(raw) = self.kv.string(KEY_APPLICATION_ADDRESS)? else {
            return Ok(None);
        };
        match ServerAddress::parse(&raw) {
            Ok(address) => Ok(Some(address)),
            Err(e) => {
                warn!(error = %e, "stored application address is invalid, removing it");
                self.kv.remove(KEY_APPLICATION_ADDRESS)?;
                Ok(None)
            }
        }
    }

    fn save_application_address(&self, address: &ServerAddress) -> Result<(), StoreError> {
        self.kv.set_string(KEY_APPLICATION_ADDRESS, address.as_str())
    }
}
