//! Backup and storage maintenance service
//!
//! Exports and restores the tracked local keys as a single JSON document,
//! reports storage usage, and wipes everything on request.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::Value;
use tracing::{info, warn};
use valentine_core::domain::stats::StorageStats;
use valentine_core::dto::backup::Backup;

use crate::error::{Result, SyncError};
use crate::repository::{LocalRepository, RemoteRepository};

/// Result of clearing all data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClearOutcome {
    /// Whether the couple's cloud record was deleted too
    pub remote_cleared: bool,
}

/// Backup, restore and storage diagnostics
#[derive(Clone)]
pub struct BackupService {
    local: LocalRepository,
    remote: Option<Arc<dyn RemoteRepository>>,
}

impl BackupService {
    pub fn new(local: LocalRepository, remote: Option<Arc<dyn RemoteRepository>>) -> Self {
        Self { local, remote }
    }

    /// Pretty-printed JSON snapshot of every tracked key
    pub fn export(&self) -> Result<String> {
        let backup = self.local.export_backup()?;
        Ok(backup.to_pretty_json()?)
    }

    /// Writes the export to `valentine-backup-<date>.json` inside `dir`
    ///
    /// # Returns
    /// Path of the written file
    pub fn export_to_file(&self, dir: &Path, date: NaiveDate) -> Result<PathBuf> {
        let json = self.export()?;
        let path = dir.join(Backup::file_name(date));
        std::fs::write(&path, json)?;
        info!(path = %path.display(), "Data exported");
        Ok(path)
    }

    /// Restores a backup document
    ///
    /// The whole document is parsed before anything is written, so invalid
    /// input leaves local storage untouched.
    ///
    /// # Returns
    /// Number of keys restored
    pub fn import(&self, text: &str) -> Result<usize> {
        let backup = Backup::parse(text)?;
        let restored = self.local.import_backup(&backup)?;
        info!(keys = restored, "Data imported");
        Ok(restored)
    }

    /// Removes both tabs' pages locally and the couple's cloud record
    ///
    /// The cloud delete is best-effort; a failure is logged and reported
    /// through [`ClearOutcome::remote_cleared`].
    pub async fn clear_all(&self) -> Result<ClearOutcome> {
        self.local.clear_pages()?;
        info!("Local pages cleared");

        let Some(remote) = &self.remote else {
            return Ok(ClearOutcome {
                remote_cleared: false,
            });
        };

        let couple = self.local.couple_id()?;
        let remote_cleared = match remote.clear_couple(&couple).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Error clearing cloud data");
                false
            }
        };
        Ok(ClearOutcome { remote_cleared })
    }

    /// Per-tab fill statistics and storage usage
    pub fn stats(&self) -> Result<StorageStats> {
        self.local.stats()
    }

    /// Raw cloud record of the current couple
    ///
    /// # Errors
    /// Returns [`SyncError::RemoteDisabled`] when running local-only.
    pub async fn export_cloud(&self) -> Result<Option<Value>> {
        let remote = self.remote.as_ref().ok_or(SyncError::RemoteDisabled)?;
        let couple = self.local.couple_id()?;
        remote.export_couple(&couple).await
    }

    /// Whether local storage accepts writes
    pub fn is_available(&self) -> bool {
        self.local.is_available()
    }
}
