//! Valentine Sync
//!
//! Local storage and cloud mirroring for the Valentine book.
//!
//! Architecture:
//! - Configuration: where local data lives and how the cloud is reached
//! - Repositories: the local key-value store and the shared cloud record
//! - Services: load/save orchestration, couple pairing, backups
//!
//! [`Valentine`] wires the layers together from a [`Config`].

pub mod config;
pub mod error;
pub mod repository;
pub mod service;

use std::sync::Arc;

use tracing::info;
use valentine_client::CloudClient;

pub use config::Config;
pub use error::{Result, SyncError};

use crate::repository::{CloudRemote, FileStore, LocalRepository, RemoteRepository};
use crate::service::{BackupService, CoupleService, SyncService};

/// Handle on an opened book and its services
#[derive(Clone)]
pub struct Valentine {
    sync: SyncService,
    couple: CoupleService,
    backup: BackupService,
}

impl Valentine {
    /// Opens the book described by `config`
    ///
    /// Local storage is a file under `config.data_dir`. The cloud remote is
    /// attached only when a database URL is set and offline mode is off.
    pub fn open(config: &Config) -> Result<Self> {
        config.validate()?;

        let store = FileStore::new(config.storage_path());
        let local = LocalRepository::new(Arc::new(store));

        let remote = match (&config.database_url, config.remote_enabled()) {
            (Some(url), true) => {
                let mut client = CloudClient::new(url.clone());
                if let Some(token) = &config.auth_token {
                    client = client.with_auth(token.clone());
                }
                info!(database_url = %url, "Cloud sync enabled");
                Some(Arc::new(CloudRemote::new(client)) as Arc<dyn RemoteRepository>)
            }
            _ => {
                info!("Running local-only");
                None
            }
        };

        Ok(Self::with_repositories(local, remote))
    }

    /// Builds the services over explicit repositories
    pub fn with_repositories(
        local: LocalRepository,
        remote: Option<Arc<dyn RemoteRepository>>,
    ) -> Self {
        Self {
            sync: SyncService::new(local.clone(), remote.clone()),
            couple: CoupleService::new(local.clone()),
            backup: BackupService::new(local, remote),
        }
    }

    pub fn sync(&self) -> &SyncService {
        &self.sync
    }

    pub fn couple(&self) -> &CoupleService {
        &self.couple
    }

    pub fn backup(&self) -> &BackupService {
        &self.backup
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{MemoryRemote, MemoryStore};
    use tempfile::TempDir;
    use valentine_core::domain::pages::PageBook;
    use valentine_core::domain::tab::Tab;

    #[tokio::test]
    async fn test_open_local_only_persists_across_handles() {
        let dir = TempDir::new().unwrap();
        let config = Config::local_only(dir.path());

        let book = Valentine::open(&config).unwrap();
        assert!(!book.sync().remote_enabled());
        book.sync().edit_page(Tab::Hers, 0, "hello").await.unwrap();

        let reopened = Valentine::open(&config).unwrap();
        let loaded = reopened.sync().load(Tab::Hers).await;
        assert_eq!(loaded.book.get(0), Some("hello"));
        assert!(config.storage_path().exists());
    }

    #[test]
    fn test_open_rejects_invalid_config() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::local_only(dir.path());
        config.database_url = Some("ftp://nope".to_string());
        assert!(matches!(
            Valentine::open(&config),
            Err(SyncError::InvalidConfig(_))
        ));
    }

    #[tokio::test]
    async fn test_join_switches_shared_record() {
        let remote = MemoryRemote::new();
        let shared: Arc<dyn RemoteRepository> = Arc::new(remote.clone());

        let partner = Valentine::with_repositories(
            LocalRepository::new(Arc::new(MemoryStore::new())),
            Some(shared.clone()),
        );
        partner
            .sync()
            .edit_page(Tab::Mine, 4, "from partner")
            .await
            .unwrap();
        let partner_id = partner.couple().current().unwrap();

        let me = Valentine::with_repositories(
            LocalRepository::new(Arc::new(MemoryStore::new())),
            Some(shared),
        );
        assert_eq!(me.sync().load(Tab::Mine).await.book, PageBook::new());

        me.couple().join(&format!(" {partner_id} ")).unwrap();
        let loaded = me.sync().load(Tab::Mine).await;
        assert_eq!(loaded.book.get(4), Some("from partner"));
    }
}
