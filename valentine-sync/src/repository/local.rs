//! Local repository
//!
//! Typed access to the book's entries in a [`KeyValueStore`]: the page
//! lists of both tabs, the couple ID, and the backup snapshot built from
//! them.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};
use valentine_core::domain::couple::{COUPLE_ID_KEY, CoupleId};
use valentine_core::domain::pages::PageBook;
use valentine_core::domain::stats::{StorageSize, StorageStats, TabStats};
use valentine_core::domain::tab::Tab;
use valentine_core::dto::backup::{Backup, TRACKED_KEYS};

use super::store::KeyValueStore;
use crate::error::{Result, SyncError};

const PROBE_KEY: &str = "__valentine_storage_test__";

/// Repository over the local key-value store
#[derive(Clone)]
pub struct LocalRepository {
    store: Arc<dyn KeyValueStore>,
}

impl LocalRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    // =============================================================================
    // Pages
    // =============================================================================

    /// Loads the pages stored for a tab
    ///
    /// # Returns
    /// `None` when nothing is stored, or when the stored value is not an
    /// array of exactly 100 pages
    pub fn load_pages(&self, tab: Tab) -> Result<Option<PageBook>> {
        let Some(raw) = self.store.get(tab.storage_key())? else {
            return Ok(None);
        };

        let book = PageBook::from_json_str(&raw);
        if book.is_none() {
            warn!(key = tab.storage_key(), "Stored pages are malformed, ignoring");
        }
        Ok(book)
    }

    /// Stores the pages of a tab as a compact JSON array
    pub fn save_pages(&self, tab: Tab, book: &PageBook) -> Result<()> {
        let raw = serde_json::to_string(book.as_slice()).map_err(|e| SyncError::CorruptEntry {
            key: tab.storage_key().to_string(),
            reason: e.to_string(),
        })?;
        self.store.set(tab.storage_key(), &raw)?;
        debug!(
            key = tab.storage_key(),
            filled = book.filled_count(),
            "Saved pages locally"
        );
        Ok(())
    }

    /// Removes the stored pages of both tabs
    pub fn clear_pages(&self) -> Result<()> {
        for tab in Tab::ALL {
            self.store.remove(tab.storage_key())?;
        }
        Ok(())
    }

    // =============================================================================
    // Couple ID
    // =============================================================================

    /// Returns the stored couple ID, generating and storing one if needed
    pub fn couple_id(&self) -> Result<CoupleId> {
        if let Some(raw) = self.store.get(COUPLE_ID_KEY)? {
            if let Ok(id) = CoupleId::parse(&raw) {
                return Ok(id);
            }
        }

        let id = CoupleId::generate();
        self.store.set(COUPLE_ID_KEY, id.as_str())?;
        info!(couple_id = %id, "Generated new couple ID");
        Ok(id)
    }

    /// Replaces the stored couple ID
    pub fn set_couple_id(&self, id: &CoupleId) -> Result<()> {
        self.store.set(COUPLE_ID_KEY, id.as_str())?;
        Ok(())
    }

    // =============================================================================
    // Backup
    // =============================================================================

    /// Snapshot of every tracked key that is currently stored
    ///
    /// # Errors
    /// Returns [`SyncError::CorruptEntry`] when a stored value is not JSON.
    pub fn export_backup(&self) -> Result<Backup> {
        let mut backup = Backup::new();
        for key in TRACKED_KEYS {
            if let Some(raw) = self.store.get(key)? {
                let value: Value =
                    serde_json::from_str(&raw).map_err(|e| SyncError::CorruptEntry {
                        key: key.to_string(),
                        reason: e.to_string(),
                    })?;
                backup.insert(key, value);
            }
        }
        Ok(backup)
    }

    /// Writes every entry of a backup over the matching local keys
    ///
    /// # Returns
    /// Number of keys written
    pub fn import_backup(&self, backup: &Backup) -> Result<usize> {
        let encoded: Vec<(&str, String)> = backup
            .entries()
            .map(|(key, value)| (key, value.to_string()))
            .collect();

        for (key, raw) in &encoded {
            self.store.set(key, raw)?;
        }
        Ok(encoded.len())
    }

    // =============================================================================
    // Diagnostics
    // =============================================================================

    /// Fill statistics per tab plus total storage usage
    pub fn stats(&self) -> Result<StorageStats> {
        let mut stats = StorageStats::default();

        for tab in Tab::ALL {
            let Some(raw) = self.store.get(tab.storage_key())? else {
                continue;
            };
            match serde_json::from_str::<Value>(&raw) {
                Ok(value) => {
                    if let Some(tab_stats) = TabStats::from_json_value(&value) {
                        stats.insert(tab, tab_stats);
                    }
                }
                Err(e) => warn!(key = tab.storage_key(), error = %e, "Error reading stored pages"),
            }
        }

        stats.size = self.size()?;
        Ok(stats)
    }

    /// Total size of everything in the store
    pub fn size(&self) -> Result<StorageSize> {
        let entries = self.store.entries()?;
        Ok(StorageSize::measure(
            entries.iter().map(|(k, v)| (k.as_str(), v.as_str())),
        ))
    }

    /// Checks that the store accepts writes
    pub fn is_available(&self) -> bool {
        let probe = self
            .store
            .set(PROBE_KEY, PROBE_KEY)
            .and_then(|_| self.store.remove(PROBE_KEY));

        match probe {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Local storage is not available");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemoryStore;
    use serde_json::json;

    fn repo() -> (LocalRepository, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (LocalRepository::new(store.clone()), store)
    }

    #[test]
    fn test_pages_round_trip() {
        let (repo, store) = repo();
        let mut book = PageBook::new();
        book.set(0, "first").unwrap();
        book.set(99, "last ❤️").unwrap();

        repo.save_pages(Tab::Mine, &book).unwrap();
        assert_eq!(repo.load_pages(Tab::Mine).unwrap(), Some(book.clone()));
        assert_eq!(repo.load_pages(Tab::Hers).unwrap(), None);

        let raw = store.get("valentine-my-pages").unwrap().unwrap();
        assert_eq!(raw, serde_json::to_string(book.as_slice()).unwrap());
    }

    #[test]
    fn test_malformed_pages_are_ignored() {
        let (repo, store) = repo();
        store.set("valentine-my-pages", "[\"only one\"]").unwrap();
        store.set("valentine-her-pages", "garbage").unwrap();
        assert_eq!(repo.load_pages(Tab::Mine).unwrap(), None);
        assert_eq!(repo.load_pages(Tab::Hers).unwrap(), None);
    }

    #[test]
    fn test_couple_id_is_generated_once() {
        let (repo, store) = repo();
        let first = repo.couple_id().unwrap();
        let second = repo.couple_id().unwrap();
        assert_eq!(first, second);
        assert_eq!(
            store.get(COUPLE_ID_KEY).unwrap().as_deref(),
            Some(first.as_str())
        );

        let joined = CoupleId::parse("couple_partner").unwrap();
        repo.set_couple_id(&joined).unwrap();
        assert_eq!(repo.couple_id().unwrap(), joined);
    }

    #[test]
    fn test_export_skips_missing_keys_and_untracked_entries() {
        let (repo, store) = repo();
        store.set("valentine-her-pages", "[\"a\"]").unwrap();
        store.set(COUPLE_ID_KEY, "couple_x").unwrap();

        let backup = repo.export_backup().unwrap();
        assert_eq!(backup.len(), 1);
        assert_eq!(backup.get("valentine-her-pages"), Some(&json!(["a"])));
    }

    #[test]
    fn test_export_fails_on_corrupt_entry() {
        let (repo, store) = repo();
        store.set("valentine-my-pages", "{oops").unwrap();
        assert!(matches!(
            repo.export_backup(),
            Err(SyncError::CorruptEntry { .. })
        ));
    }

    #[test]
    fn test_stats_and_size() {
        let (repo, store) = repo();
        let mut book = PageBook::new();
        book.set(1, "one").unwrap();
        repo.save_pages(Tab::Hers, &book).unwrap();
        store.set("unrelated", "xyz").unwrap();

        let stats = repo.stats().unwrap();
        assert_eq!(stats.get(Tab::Hers).unwrap().filled_pages, 1);
        assert!(stats.get(Tab::Mine).is_none());

        let expected: usize = store
            .entries()
            .unwrap()
            .iter()
            .map(|(k, v)| k.len() + v.len())
            .sum();
        assert_eq!(stats.size.used_bytes, expected);
    }

    #[test]
    fn test_is_available_leaves_no_probe() {
        let (repo, store) = repo();
        assert!(repo.is_available());
        assert!(store.entries().unwrap().is_empty());
    }
}
