//! Backup document
//!
//! A backup is a JSON object mapping local storage key names to the values
//! stored under them. Only the page keys are tracked. Values are carried
//! as-is: importing checks that the document parses, not that every value
//! is a well-formed page list.

use chrono::NaiveDate;
use serde_json::{Map, Value};

use crate::domain::tab::Tab;
use crate::error::{CoreError, Result};

/// Local storage keys included in a backup
pub const TRACKED_KEYS: [&str; 2] = [Tab::Mine.storage_key(), Tab::Hers.storage_key()];

/// Snapshot of the tracked local keys
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Backup {
    entries: Map<String, Value>,
}

impl Backup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a key is tracked by backups
    pub fn is_tracked(key: &str) -> bool {
        TRACKED_KEYS.contains(&key)
    }

    /// Adds an entry. Untracked keys are ignored.
    pub fn insert(&mut self, key: &str, value: Value) -> bool {
        if !Self::is_tracked(key) {
            return false;
        }
        self.entries.insert(key.to_string(), value);
        true
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Tracked entries in key order
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Renders the backup as indented JSON
    pub fn to_pretty_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.entries)
            .map_err(|e| CoreError::InvalidBackup(e.to_string()))
    }

    /// Parses a backup document
    ///
    /// The text must be a JSON object. Keys that are not tracked are dropped.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidBackup`] when the text is not JSON or is
    /// not an object.
    pub fn parse(text: &str) -> Result<Self> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| CoreError::InvalidBackup(e.to_string()))?;

        let Value::Object(object) = value else {
            return Err(CoreError::InvalidBackup(
                "backup must be a JSON object".to_string(),
            ));
        };

        let mut backup = Self::new();
        for (key, value) in object {
            backup.insert(&key, value);
        }
        Ok(backup)
    }

    /// Download name for a backup taken on `date`
    pub fn file_name(date: NaiveDate) -> String {
        format!("valentine-backup-{}.json", date.format("%Y-%m-%d"))
    }
}
