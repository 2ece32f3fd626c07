// SettlementStore - persistent key-value storage using sled
//
// Stores compact binary snapshots of settlement state keyed by token
// symbol. Callback registries are runtime-only and are re-registered after
// a load.

use crate::settlement::Settlement;
use std::path::Path;
use thiserror::Error;

/// Key prefixes for organizing data
mod keys {
    pub const SETTLEMENT_PREFIX: &[u8] = b"settlement:";
}

/// Errors from storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to open database: {0}")]
    OpenFailed(String),

    #[error("Database operation failed: {0}")]
    DatabaseError(String),

    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),

    #[error("Flush failed: {0}")]
    FlushFailed(String),
}

impl From<sled::Error> for StoreError {
    fn from(err: sled::Error) -> Self {
        StoreError::DatabaseError(err.to_string())
    }
}

/// Statistics about the storage
#[derive(Clone, Debug)]
pub struct StorageStats {
    /// Number of keys in the database
    pub key_count: usize,
    /// Approximate disk size in bytes
    pub disk_size_bytes: u64,
}

/// Persistent key-value store for settlement snapshots
///
/// Uses sled for crash-safe, embedded storage.
/// All writes are atomic and durable after flush.
pub struct SettlementStore {
    db: sled::Db,
}

impl SettlementStore {
    /// Open or create a store at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let db = sled::open(path).map_err(|e| StoreError::OpenFailed(e.to_string()))?;
        Ok(Self { db })
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.db.is_empty())
    }

    /// Flush all pending writes to disk
    pub fn flush(&self) -> Result<(), StoreError> {
        self.db
            .flush()
            .map_err(|e| StoreError::FlushFailed(e.to_string()))?;
        Ok(())
    }

    /// Get storage statistics
    pub fn stats(&self) -> Result<StorageStats, StoreError> {
        Ok(StorageStats {
            key_count: self.db.len(),
            disk_size_bytes: self.db.size_on_disk().unwrap_or(0),
        })
    }

    // ========================================================================
    // RAW KEY-VALUE OPERATIONS
    // ========================================================================

    /// Put raw bytes
    pub fn put_raw(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.db.insert(key, value)?;
        Ok(())
    }

    /// Get raw bytes
    pub fn get_raw(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.db.get(key)?.map(|v| v.to_vec()))
    }

    /// Delete a key
    pub fn delete(&self, key: &[u8]) -> Result<(), StoreError> {
        self.db.remove(key)?;
        Ok(())
    }

    /// List all keys with a given prefix
    pub fn list_keys_with_prefix(&self, prefix: &[u8]) -> Result<Vec<Vec<u8>>, StoreError> {
        let mut keys = Vec::new();
        for result in self.db.scan_prefix(prefix) {
            let (key, _) = result?;
            keys.push(key.to_vec());
        }
        Ok(keys)
    }

    // ========================================================================
    // SETTLEMENT PERSISTENCE
    // ========================================================================

    /// Save a settlement snapshot, keyed by its token symbol
    pub fn save_settlement(&self, settlement: &Settlement) -> Result<(), StoreError> {
        let key = [keys::SETTLEMENT_PREFIX, settlement.token().symbol().as_bytes()].concat();
        let bytes = postcard::to_allocvec(settlement)
            .map_err(|e| StoreError::SerializationFailed(e.to_string()))?;
        self.put_raw(&key, &bytes)
    }

    /// Load the settlement snapshot for a token symbol
    pub fn load_settlement(&self, symbol: &str) -> Result<Option<Settlement>, StoreError> {
        let key = [keys::SETTLEMENT_PREFIX, symbol.as_bytes()].concat();
        match self.get_raw(&key)? {
            Some(bytes) => {
                let settlement = postcard::from_bytes(&bytes)
                    .map_err(|e| StoreError::DeserializationFailed(e.to_string()))?;
                Ok(Some(settlement))
            }
            None => Ok(None),
        }
    }

    /// List the token symbols with saved settlements
    pub fn list_settlements(&self) -> Result<Vec<String>, StoreError> {
        let mut symbols = Vec::new();
        for key in self.list_keys_with_prefix(keys::SETTLEMENT_PREFIX)? {
            let suffix = &key[keys::SETTLEMENT_PREFIX.len()..];
            if let Ok(symbol) = std::str::from_utf8(suffix) {
                symbols.push(symbol.to_string());
            }
        }
        Ok(symbols)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_store_basic() {
        let temp_dir = TempDir::new().unwrap();
        let store = SettlementStore::open(temp_dir.path()).unwrap();

        store.put_raw(b"test", b"value").unwrap();
        let result = store.get_raw(b"test").unwrap();

        assert_eq!(result, Some(b"value".to_vec()));
    }

    #[test]
    fn test_store_persistence() {
        let temp_dir = TempDir::new().unwrap();

        {
            let store = SettlementStore::open(temp_dir.path()).unwrap();
            store.put_raw(b"persist", b"data").unwrap();
            store.flush().unwrap();
        }

        {
            let store = SettlementStore::open(temp_dir.path()).unwrap();
            let result = store.get_raw(b"persist").unwrap();
            assert_eq!(result, Some(b"data".to_vec()));
        }
    }
}
