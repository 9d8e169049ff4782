//! Configuration module
//!
//! Turns the global CLI flags into the storage and sync configuration and
//! opens the book.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::debug;
use valentine_sync::Valentine;

/// CLI configuration
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Local storage directory; the platform data dir when unset
    pub data_dir: Option<PathBuf>,

    /// Cloud database URL; the compiled-in URL when unset
    pub database_url: Option<String>,

    /// Cloud database auth token; the compiled-in token when unset
    pub auth_token: Option<String>,

    /// Skip the cloud database
    pub offline: bool,
}

impl Config {
    /// Resolves the flags against the compiled-in defaults
    pub fn resolve(&self) -> Result<valentine_sync::Config> {
        let data_dir = match &self.data_dir {
            Some(dir) => dir.clone(),
            None => valentine_sync::Config::default_data_dir()
                .context("Could not determine a data directory, pass --data-dir")?,
        };

        let mut config = valentine_sync::Config::new(data_dir);
        if let Some(url) = non_empty(self.database_url.as_deref()) {
            config.database_url = Some(url);
        }
        if let Some(token) = non_empty(self.auth_token.as_deref()) {
            config.auth_token = Some(token);
        }
        config.offline = self.offline;
        Ok(config)
    }

    /// Opens the book with the resolved configuration
    pub fn open(&self) -> Result<Valentine> {
        let config = self.resolve()?;
        debug!(
            data_dir = %config.data_dir.display(),
            remote = config.remote_enabled(),
            "Opening book"
        );
        Valentine::open(&config).context("Failed to open the book")
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_defaults() {
        let config = Config {
            data_dir: Some(PathBuf::from("/tmp/book")),
            database_url: Some("https://db.example.com".to_string()),
            auth_token: Some("secret".to_string()),
            offline: false,
        };

        let resolved = config.resolve().unwrap();
        assert_eq!(resolved.data_dir, PathBuf::from("/tmp/book"));
        assert_eq!(
            resolved.database_url.as_deref(),
            Some("https://db.example.com")
        );
        assert_eq!(resolved.auth_token.as_deref(), Some("secret"));
        assert!(resolved.remote_enabled());
    }

    #[test]
    fn test_offline_disables_remote() {
        let config = Config {
            data_dir: Some(PathBuf::from("/tmp/book")),
            database_url: Some("https://db.example.com".to_string()),
            offline: true,
            ..Config::default()
        };
        assert!(!config.resolve().unwrap().remote_enabled());
    }

    #[test]
    fn test_open_local_book() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = Config {
            data_dir: Some(dir.path().to_path_buf()),
            offline: true,
            ..Config::default()
        };
        let book = config.open().unwrap();
        assert!(!book.sync().remote_enabled());
    }
}
