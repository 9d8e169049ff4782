//! Storage statistics
//!
//! Summaries shown by the storage manager: how many pages are filled per
//! tab and how much local storage the book occupies.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::pages::{PAGE_COUNT, PageBook};
use super::tab::Tab;

/// Fill statistics for one tab
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabStats {
    pub total_pages: usize,
    pub filled_pages: usize,
}

impl From<&PageBook> for TabStats {
    fn from(book: &PageBook) -> Self {
        Self {
            total_pages: book.len(),
            filled_pages: book.filled_count(),
        }
    }
}

impl TabStats {
    /// Counts pages in a stored JSON array of any length
    ///
    /// Non-string entries count towards the total but never as filled.
    pub fn from_json_value(value: &serde_json::Value) -> Option<Self> {
        let items = value.as_array()?;
        Some(Self {
            total_pages: items.len(),
            filled_pages: items
                .iter()
                .filter(|item| item.as_str().is_some_and(|s| !s.trim().is_empty()))
                .count(),
        })
    }
}

/// Approximate local storage usage
///
/// Counted as the sum of key length plus value length over every stored
/// entry, the same way a browser reports its storage quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StorageSize {
    pub used_bytes: usize,
}

impl StorageSize {
    /// Adds up a sequence of stored entries
    pub fn measure<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let used_bytes = entries
            .into_iter()
            .map(|(key, value)| key.len() + value.len())
            .sum();
        Self { used_bytes }
    }

    /// Usage in kilobytes with two decimals, e.g. "1.25 KB"
    pub fn formatted(&self) -> String {
        format!("{:.2} KB", self.used_bytes as f64 / 1024.0)
    }
}

/// Aggregate statistics over both tabs
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StorageStats {
    /// Stats per tab; tabs with nothing stored are absent
    pub tabs: BTreeMap<String, TabStats>,
    pub size: StorageSize,
}

impl StorageStats {
    /// Records the stats of one tab
    pub fn insert(&mut self, tab: Tab, stats: TabStats) {
        self.tabs.insert(tab.storage_key().to_string(), stats);
    }

    /// Stats recorded for a tab
    pub fn get(&self, tab: Tab) -> Option<&TabStats> {
        self.tabs.get(tab.storage_key())
    }

    /// Filled pages across every tab
    pub fn total_filled(&self) -> usize {
        self.tabs.values().map(|s| s.filled_pages).sum()
    }

    /// Page capacity across both tabs
    pub fn capacity() -> usize {
        PAGE_COUNT * Tab::ALL.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_size_formatting() {
        let size = StorageSize::measure([("ab", "cd"), ("valentine", "")]);
        assert_eq!(size.used_bytes, 13);
        assert_eq!(size.formatted(), "0.01 KB");
        assert_eq!(StorageSize { used_bytes: 2048 }.formatted(), "2.00 KB");
    }

    #[test]
    fn test_tab_stats_from_raw_array() {
        let value = serde_json::json!(["a", " ", null, "b"]);
        let stats = TabStats::from_json_value(&value).unwrap();
        assert_eq!(stats.total_pages, 4);
        assert_eq!(stats.filled_pages, 2);
        assert!(TabStats::from_json_value(&serde_json::json!("x")).is_none());
    }

    #[test]
    fn test_total_filled() {
        let mut mine = PageBook::new();
        mine.set(0, "a").unwrap();
        mine.set(1, "b").unwrap();
        let mut hers = PageBook::new();
        hers.set(99, "c").unwrap();

        let mut stats = StorageStats::default();
        stats.insert(Tab::Mine, TabStats::from(&mine));
        stats.insert(Tab::Hers, TabStats::from(&hers));

        assert_eq!(stats.total_filled(), 3);
        assert_eq!(stats.get(Tab::Mine).unwrap().filled_pages, 2);
        assert_eq!(StorageStats::capacity(), 200);
    }
}
