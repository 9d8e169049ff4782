//! Key-value store
//!
//! Local persistence works like browser storage: string values under string
//! keys, read and written synchronously. [`FileStore`] keeps every key in a
//! single JSON object on disk; [`MemoryStore`] keeps them in memory.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use thiserror::Error;
use tracing::{debug, warn};

/// Errors raised by a key-value store
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The store contents could not be encoded
    #[error("Failed to encode store: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Synchronous string key-value storage
pub trait KeyValueStore: Send + Sync {
    /// Reads the value under a key
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Writes a value, replacing any previous one
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Deletes a key. Deleting a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Every stored entry in key order
    fn entries(&self) -> Result<Vec<(String, String)>, StoreError>;
}

/// Store persisted as one JSON object file
///
/// Each write rewrites the whole file through a temporary file in the same
/// directory followed by a rename, so a crash never leaves half a file.
/// Writers hold an exclusive lock on a sidecar `<file>.lock` for the whole
/// read-modify-write, so processes sharing a data directory never drop each
/// other's keys.
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    /// Opens a store backed by `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    /// Reads the whole map. A missing file is empty; a corrupt one is
    /// logged and treated as empty.
    fn read_map(&self) -> Result<BTreeMap<String, String>, StoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(self.io_error(e)),
        };

        match serde_json::from_str(&raw) {
            Ok(map) => Ok(map),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Local storage file is corrupt, starting empty");
                Ok(BTreeMap::new())
            }
        }
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".lock");
        PathBuf::from(name)
    }

    /// Takes the cross-process write lock; released when the file is dropped
    fn lock_file(&self) -> Result<fs::File, StoreError> {
        fs::create_dir_all(self.parent_dir()).map_err(|e| self.io_error(e))?;
        let file = fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.lock_path())
            .map_err(|e| self.io_error(e))?;
        file.lock().map_err(|e| self.io_error(e))?;
        Ok(file)
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let content = serde_json::to_vec_pretty(map)?;

        let parent = self.parent_dir();
        fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;

        let mut temp = tempfile::NamedTempFile::new_in(parent).map_err(|e| self.io_error(e))?;
        temp.write_all(&content).map_err(|e| self.io_error(e))?;
        temp.persist(&self.path)
            .map_err(|e| self.io_error(e.error))?;

        debug!(path = %self.path.display(), keys = map.len(), "Wrote local storage");
        Ok(())
    }

    fn update<F>(&self, change: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut BTreeMap<String, String>) -> bool,
    {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let _file_lock = self.lock_file()?;
        let mut map = self.read_map()?;
        if change(&mut map) {
            self.write_map(&map)?;
        }
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.read_map()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.update(|map| {
            map.insert(key.to_string(), value.to_string());
            true
        })
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.update(|map| map.remove(key).is_some())
    }

    fn entries(&self) -> Result<Vec<(String, String)>, StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.read_map()?.into_iter().collect())
    }
}

/// Store held in memory
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }

    fn entries(&self) -> Result<Vec<(String, String)>, StoreError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_store_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("nested").join("storage.json"));

        assert_eq!(store.get("a").unwrap(), None);
        store.set("a", "1").unwrap();
        store.set("b", "[\"x\"]").unwrap();
        assert_eq!(store.get("a").unwrap(), Some("1".to_string()));

        let reopened = FileStore::new(store.path().to_path_buf());
        assert_eq!(
            reopened.entries().unwrap(),
            vec![
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "[\"x\"]".to_string())
            ]
        );

        reopened.remove("a").unwrap();
        reopened.remove("missing").unwrap();
        assert_eq!(store.get("a").unwrap(), None);
    }

    #[test]
    fn test_file_store_corrupt_file_reads_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("storage.json");
        fs::write(&path, "{ not json").unwrap();

        let store = FileStore::new(&path);
        assert!(store.entries().unwrap().is_empty());

        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap(), Some("v".to_string()));
    }

    #[test]
    fn test_concurrent_handles_keep_every_key() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("storage.json");

        let writers: Vec<_> = ["left", "right"]
            .into_iter()
            .map(|side| {
                let store = FileStore::new(&path);
                std::thread::spawn(move || {
                    for round in 0..50 {
                        store.set(&format!("{side}-{round}"), side).unwrap();
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }

        let entries = FileStore::new(&path).entries().unwrap();
        assert_eq!(entries.len(), 100);
        assert!(entries.iter().any(|(k, _)| k == "left-49"));
        assert!(entries.iter().any(|(k, _)| k == "right-49"));
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new();
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap(), Some("v".to_string()));
        store.remove("k").unwrap();
        assert!(store.entries().unwrap().is_empty());
    }
}
