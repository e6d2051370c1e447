//! In-memory storage backend.
//!
//! Used by tests and by embedders that want a throwaway store. All mutations
//! happen under a single write lock, which trivially satisfies the atomicity
//! requirements of [`StorageBackend`].

use std::collections::BTreeMap;

use parking_lot::RwLock;

use crate::error::Result;
use crate::storage::traits::StorageBackend;

#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl StorageBackend for MemoryBackend {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn write(&self, key: &str, bytes: &[u8]) -> Result<()> {
        self.entries.write().insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    fn write_new(&self, key: &str, bytes: &[u8]) -> Result<bool> {
        let mut entries = self.entries.write();
        if entries.contains_key(key) {
            return Ok(false);
        }
        entries.insert(key.to_string(), bytes.to_vec());
        Ok(true)
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let entries = self.entries.read();
        Ok(entries
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect())
    }

    fn delete(&self, prefix: &str) -> Result<()> {
        let mut entries = self.entries.write();
        if prefix.ends_with('/') {
            entries.retain(|key, _| !key.starts_with(prefix));
        } else {
            entries.remove(prefix);
        }
        Ok(())
    }
}
