//! Storage backend trait definition.
//!
//! The `StorageBackend` trait is the only capability the version store needs
//! from persistence. Keeping it this small lets the store run unchanged
//! against the filesystem, an object store, or the in-memory fake used in
//! tests.

use crate::error::Result;

/// Key/value persistence capability.
///
/// Keys are `/`-separated relative paths such as
/// `prompts/<project>/<prompt>/versions/0000000001.json`. A prefix ending in
/// `/` addresses everything below that "directory".
///
/// All implementations must ensure:
/// - `write` and `write_new` are atomic: readers observe either the old
///   bytes or the new bytes, never a partial record
/// - a successful write is visible to every subsequent `read`/`list`,
///   including from other processes
/// - `delete` of a prefix is all-or-nothing from a reader's point of view
pub trait StorageBackend: Send + Sync {
    /// Read the bytes stored under `key`.
    ///
    /// Returns `Ok(None)` if the key does not exist.
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Atomically replace the bytes stored under `key`.
    fn write(&self, key: &str, bytes: &[u8]) -> Result<()>;

    /// Atomically create `key` if it does not exist yet.
    ///
    /// Returns `Ok(false)` without touching the stored bytes if the key is
    /// already present. This is the primitive that keeps version numbers and
    /// tag names unique across concurrent writers.
    fn write_new(&self, key: &str, bytes: &[u8]) -> Result<bool>;

    /// List every key starting with `prefix`, sorted ascending.
    fn list(&self, prefix: &str) -> Result<Vec<String>>;

    /// Delete every key starting with `prefix`.
    ///
    /// Deleting a prefix that matches nothing is not an error.
    fn delete(&self, prefix: &str) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trait_is_object_safe() {
        fn _accepts_backend(_backend: &dyn StorageBackend) {}
    }
}
