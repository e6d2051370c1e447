//! Filesystem storage backend.
//!
//! Every key maps to one file below the backend root. Writes go to a hidden
//! temp file in the destination directory, are synced, and are then moved
//! into place, so a record is never observable half-written. Hidden entries
//! (names starting with `.`) are invisible to `list`.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use uuid::Uuid;
use walkdir::WalkDir;

use crate::error::{PromptvError, Result};
use crate::storage::traits::StorageBackend;

/// Filesystem-backed key/value store rooted at a directory.
#[derive(Debug, Clone)]
pub struct FsBackend {
    root: PathBuf,
}

impl FsBackend {
    /// Create a backend rooted at `root`. The directory is created lazily on
    /// first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let trimmed = key.trim_end_matches('/');
        if trimmed.is_empty() {
            return Ok(self.root.clone());
        }
        let mut path = self.root.clone();
        for segment in trimmed.split('/') {
            if segment.is_empty() || segment == "." || segment == ".." || segment.starts_with('.')
            {
                return Err(PromptvError::storage(format!("Invalid storage key: {}", key)));
            }
            path.push(segment);
        }
        Ok(path)
    }

    fn temp_path_for(path: &Path) -> Result<PathBuf> {
        let parent = path
            .parent()
            .ok_or_else(|| PromptvError::storage("Storage key has no parent directory"))?;
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| PromptvError::storage("Invalid storage filename"))?;
        Ok(parent.join(format!(".{}.{}.tmp", filename, Uuid::new_v4().simple())))
    }

    /// Write `bytes` to a fresh, synced temp file next to `path`.
    fn write_temp(path: &Path, bytes: &[u8]) -> Result<PathBuf> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let temp_path = Self::temp_path_for(path)?;
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_path)?;
        let written = file.write_all(bytes).and_then(|_| file.sync_all());
        if let Err(err) = written {
            let _ = fs::remove_file(&temp_path);
            return Err(err.into());
        }
        Ok(temp_path)
    }

    fn key_for(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let segments: Vec<&str> = relative
            .components()
            .map(|component| component.as_os_str().to_str())
            .collect::<Option<Vec<_>>>()?;
        Some(segments.join("/"))
    }
}

impl StorageBackend for FsBackend {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(key)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn write(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path_for(key)?;
        let temp_path = Self::write_temp(&path, bytes)?;
        rename_with_fallback(&temp_path, &path)?;
        Ok(())
    }

    fn write_new(&self, key: &str, bytes: &[u8]) -> Result<bool> {
        let path = self.path_for(key)?;
        let temp_path = Self::write_temp(&path, bytes)?;
        // hard_link fails with AlreadyExists instead of replacing the target.
        let linked = fs::hard_link(&temp_path, &path);
        let _ = fs::remove_file(&temp_path);
        match linked {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let base = if prefix.is_empty() || prefix.ends_with('/') {
            self.path_for(prefix)?
        } else {
            match self.path_for(prefix)?.parent() {
                Some(parent) => parent.to_path_buf(),
                None => return Ok(Vec::new()),
            }
        };
        if !base.is_dir() {
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        let walker = WalkDir::new(&base).into_iter().filter_entry(|entry| {
            entry.depth() == 0 || !entry.file_name().to_string_lossy().starts_with('.')
        });
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                // Removed by a concurrent delete while walking.
                Err(err)
                    if err
                        .io_error()
                        .is_some_and(|e| e.kind() == io::ErrorKind::NotFound) =>
                {
                    continue
                }
                Err(err) => {
                    return Err(PromptvError::storage(format!(
                        "Failed to walk {}: {}",
                        base.display(),
                        err
                    )))
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(key) = self.key_for(entry.path()) {
                if key.starts_with(prefix) {
                    keys.push(key);
                }
            }
        }
        keys.sort();
        Ok(keys)
    }

    fn delete(&self, prefix: &str) -> Result<()> {
        let path = self.path_for(prefix)?;
        if !prefix.ends_with('/') {
            return match fs::remove_file(&path) {
                Ok(()) => Ok(()),
                Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
                Err(err) => Err(err.into()),
            };
        }
        if path == self.root {
            return Err(PromptvError::storage("Refusing to delete the storage root"));
        }
        if !path.is_dir() {
            return Ok(());
        }

        // Move the whole subtree out of sight in one rename; readers see it
        // either fully present or fully gone.
        let parent = path
            .parent()
            .ok_or_else(|| PromptvError::storage("Storage key has no parent directory"))?;
        let trash = parent.join(format!(".trash-{}", Uuid::new_v4().simple()));
        fs::rename(&path, &trash)?;
        if let Err(err) = fs::remove_dir_all(&trash) {
            tracing::warn!(path = %trash.display(), error = %err, "failed to purge trash directory");
        }
        Ok(())
    }
}

/// Atomically rename a file, with fallback for platforms where rename fails if target exists.
///
/// On some platforms (notably Windows), `fs::rename` fails if the destination already exists.
/// This function handles that case by removing the destination first and retrying.
///
/// If the rename ultimately fails, the temp file is cleaned up.
pub fn rename_with_fallback(temp_path: &Path, destination: &Path) -> io::Result<()> {
    if let Err(initial_err) = fs::rename(temp_path, destination) {
        let _ = fs::remove_file(destination);
        fs::rename(temp_path, destination).map_err(|retry_err| {
            let _ = fs::remove_file(temp_path);
            io::Error::new(
                retry_err.kind(),
                format!(
                    "Atomic rename failed (initial: {}, retry: {})",
                    initial_err, retry_err
                ),
            )
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::tempdir;

    #[test]
    fn test_rename_overwrites_existing() {
        let dir = tempdir().unwrap();
        let temp = dir.path().join("temp.txt");
        let dest = dir.path().join("dest.txt");

        File::create(&dest).unwrap().write_all(b"old").unwrap();
        File::create(&temp).unwrap().write_all(b"new").unwrap();

        rename_with_fallback(&temp, &dest).unwrap();

        assert!(!temp.exists());
        assert_eq!(fs::read_to_string(&dest).unwrap(), "new");
    }

    #[test]
    fn test_write_read_round_trip() {
        let dir = tempdir().unwrap();
        let backend = FsBackend::new(dir.path());

        backend.write("a/b/c.json", b"{}").unwrap();
        assert_eq!(backend.read("a/b/c.json").unwrap(), Some(b"{}".to_vec()));
        assert_eq!(backend.read("a/b/missing.json").unwrap(), None);
    }

    #[test]
    fn test_write_new_refuses_existing_key() {
        let dir = tempdir().unwrap();
        let backend = FsBackend::new(dir.path());

        assert!(backend.write_new("k/v1.json", b"first").unwrap());
        assert!(!backend.write_new("k/v1.json", b"second").unwrap());
        assert_eq!(backend.read("k/v1.json").unwrap(), Some(b"first".to_vec()));
    }

    #[test]
    fn test_list_skips_hidden_and_filters_prefix() {
        let dir = tempdir().unwrap();
        let backend = FsBackend::new(dir.path());

        backend.write("p/one/x.json", b"1").unwrap();
        backend.write("p/two/y.json", b"2").unwrap();
        backend.write("q/z.json", b"3").unwrap();
        fs::write(dir.path().join("p/one/.x.json.tmp"), b"partial").unwrap();

        assert_eq!(
            backend.list("p/").unwrap(),
            vec!["p/one/x.json".to_string(), "p/two/y.json".to_string()]
        );
        assert_eq!(backend.list("p/one/").unwrap(), vec!["p/one/x.json".to_string()]);
        assert!(backend.list("missing/").unwrap().is_empty());
    }

    #[test]
    fn test_delete_directory_prefix_is_complete() {
        let dir = tempdir().unwrap();
        let backend = FsBackend::new(dir.path());

        backend.write("p/one/x.json", b"1").unwrap();
        backend.write("p/one/sub/y.json", b"2").unwrap();
        backend.write("p/two/z.json", b"3").unwrap();

        backend.delete("p/one/").unwrap();

        assert_eq!(backend.list("p/").unwrap(), vec!["p/two/z.json".to_string()]);
        let leftovers: Vec<_> = fs::read_dir(dir.path().join("p"))
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(leftovers.len(), 1);
    }

    #[test]
    fn test_delete_missing_is_not_an_error() {
        let dir = tempdir().unwrap();
        let backend = FsBackend::new(dir.path());

        backend.delete("nothing/here/").unwrap();
        backend.delete("nothing/here.json").unwrap();
    }

    #[test]
    fn test_rejects_traversal_keys() {
        let dir = tempdir().unwrap();
        let backend = FsBackend::new(dir.path());

        assert!(backend.read("../escape.json").is_err());
        assert!(backend.write("a/../../b.json", b"x").is_err());
    }
}
