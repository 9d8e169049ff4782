//! Storage and sync configuration
//!
//! Defines where local data lives and how the cloud database is reached.
//! The cloud settings are compiled in from `VALENTINE_DATABASE_URL` and
//! `VALENTINE_AUTH_TOKEN` when present at build time; callers may override
//! any field before opening the book.

use std::path::PathBuf;

use crate::error::{Result, SyncError};

/// Database URL baked in at build time
pub const BUILD_DATABASE_URL: Option<&str> = option_env!("VALENTINE_DATABASE_URL");

/// Auth token baked in at build time
pub const BUILD_AUTH_TOKEN: Option<&str> = option_env!("VALENTINE_AUTH_TOKEN");

/// Name of the file holding the local key-value store
pub const STORAGE_FILE: &str = "storage.json";

/// Storage and sync configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding local storage
    pub data_dir: PathBuf,

    /// Base URL of the cloud database; `None` runs local-only
    pub database_url: Option<String>,

    /// Token appended to cloud requests
    pub auth_token: Option<String>,

    /// Skip the cloud database even when one is configured
    pub offline: bool,
}

impl Config {
    /// Creates a configuration using the compiled-in cloud settings
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            database_url: BUILD_DATABASE_URL.map(str::to_string),
            auth_token: BUILD_AUTH_TOKEN.map(str::to_string),
            offline: false,
        }
    }

    /// Creates a local-only configuration
    pub fn local_only(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            database_url: None,
            auth_token: None,
            offline: false,
        }
    }

    /// Platform data directory for the book (e.g. `~/.local/share/valentine-book`)
    pub fn default_data_dir() -> Option<PathBuf> {
        dirs::data_dir().map(|dir| dir.join("valentine-book"))
    }

    /// Path of the local key-value store file
    pub fn storage_path(&self) -> PathBuf {
        self.data_dir.join(STORAGE_FILE)
    }

    /// Whether cloud sync should be used
    pub fn remote_enabled(&self) -> bool {
        !self.offline && self.database_url.is_some()
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(SyncError::InvalidConfig(
                "data_dir cannot be empty".to_string(),
            ));
        }

        if let Some(url) = &self.database_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(SyncError::InvalidConfig(
                    "database_url must start with http:// or https://".to_string(),
                ));
            }
        }

        Ok(())
    }
}
