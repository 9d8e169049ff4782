//! Page sync service
//!
//! Decides where a tab's pages are loaded from and pushes every change to
//! both stores.
//!
//! Loading prefers the cloud record, then local storage, then a fresh book.
//! Saving always writes locally first; the cloud write is best-effort and
//! a failure only leaves local storage ahead until the next save.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use valentine_core::domain::couple::CoupleId;
use valentine_core::domain::pages::PageBook;
use valentine_core::domain::tab::Tab;

use crate::error::{Result, SyncError};
use crate::repository::{LocalRepository, RemoteRepository, Subscription};

/// Where a loaded book came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    /// The cloud record; it was mirrored into local storage
    Remote,
    /// Local storage
    Local,
    /// Nothing valid was stored anywhere
    Fresh,
}

/// Result of loading a tab
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loaded {
    pub book: PageBook,
    pub source: LoadSource,
}

/// Result of saving a tab
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveOutcome {
    /// Whether the cloud record now matches local storage
    pub remote_synced: bool,
}

/// What happened when a pushed update reached local storage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteApply {
    /// Local storage already held the pushed pages
    Unchanged,
    /// Local storage was replaced with the pushed pages
    Applied,
    /// Local storage held edits the cloud had not seen; they were replaced
    OverwroteLocalEdits,
}

/// Last collection exchanged with the cloud, per couple and tab
type Baselines = Arc<Mutex<HashMap<(CoupleId, Tab), PageBook>>>;

/// Orchestrates loading and saving between local storage and the cloud
#[derive(Clone)]
pub struct SyncService {
    local: LocalRepository,
    remote: Option<Arc<dyn RemoteRepository>>,
    baselines: Baselines,
}

impl SyncService {
    /// Creates a sync service
    ///
    /// # Arguments
    /// * `local` - Local storage repository
    /// * `remote` - Cloud repository, or `None` to run local-only
    pub fn new(local: LocalRepository, remote: Option<Arc<dyn RemoteRepository>>) -> Self {
        Self {
            local,
            remote,
            baselines: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Whether a cloud repository is configured
    pub fn remote_enabled(&self) -> bool {
        self.remote.is_some()
    }

    /// Loads the pages of a tab
    ///
    /// Tries the cloud first and mirrors a valid record into local storage.
    /// Otherwise falls back to local storage, then to a fresh book. Failures
    /// along the way are logged, never returned.
    pub async fn load(&self, tab: Tab) -> Loaded {
        if let Some(book) = self.load_remote(tab).await {
            if let Err(e) = self.local.save_pages(tab, &book) {
                warn!(error = %e, "Failed to mirror cloud pages locally");
            }
            return Loaded {
                book,
                source: LoadSource::Remote,
            };
        }

        match self.local.load_pages(tab) {
            Ok(Some(book)) => {
                debug!(tab = tab.remote_label(), "Loaded pages from local storage");
                Loaded {
                    book,
                    source: LoadSource::Local,
                }
            }
            Ok(None) => Loaded {
                book: PageBook::new(),
                source: LoadSource::Fresh,
            },
            Err(e) => {
                warn!(error = %e, "Failed to read local pages, starting fresh");
                Loaded {
                    book: PageBook::new(),
                    source: LoadSource::Fresh,
                }
            }
        }
    }

    async fn load_remote(&self, tab: Tab) -> Option<PageBook> {
        let remote = self.remote.as_ref()?;
        let couple = match self.local.couple_id() {
            Ok(couple) => couple,
            Err(e) => {
                warn!(error = %e, "Couple ID unavailable, skipping cloud load");
                return None;
            }
        };

        match remote.load_pages(&couple, tab).await {
            Ok(Some(book)) => {
                self.remember(&couple, tab, &book);
                Some(book)
            }
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Failed to load from cloud");
                None
            }
        }
    }

    /// Saves the pages of a tab
    ///
    /// Local storage is always written. The cloud write follows; if it fails
    /// the error is logged and dropped, with no retry.
    ///
    /// # Errors
    /// Only a failed local write is returned.
    pub async fn save(&self, tab: Tab, book: &PageBook) -> Result<SaveOutcome> {
        self.local.save_pages(tab, book)?;

        let Some(remote) = &self.remote else {
            return Ok(SaveOutcome {
                remote_synced: false,
            });
        };

        let couple = self.local.couple_id()?;
        match remote.save_pages(&couple, tab, book).await {
            Ok(()) => {
                self.remember(&couple, tab, book);
                Ok(SaveOutcome {
                    remote_synced: true,
                })
            }
            Err(e) => {
                warn!(error = %e, "Failed to save to cloud");
                Ok(SaveOutcome {
                    remote_synced: false,
                })
            }
        }
    }

    /// Replaces the text of one page and saves the tab
    ///
    /// # Arguments
    /// * `tab` - Tab to edit
    /// * `index` - Zero-based page index
    /// * `text` - New page text (empty clears the page)
    pub async fn edit_page(
        &self,
        tab: Tab,
        index: usize,
        text: impl Into<String>,
    ) -> Result<(PageBook, SaveOutcome)> {
        let mut book = self.load(tab).await.book;
        book.set(index, text)?;
        let outcome = self.save(tab, &book).await?;
        Ok((book, outcome))
    }

    /// Follows cloud updates of a tab
    ///
    /// Every pushed collection is written to local storage on the blocking
    /// thread pool, in arrival order; whatever arrives last wins. When local storage held edits the cloud had not seen, the
    /// overwrite is reported as [`RemoteApply::OverwroteLocalEdits`].
    ///
    /// # Errors
    /// Returns [`SyncError::RemoteDisabled`] when running local-only.
    pub async fn watch<F>(&self, tab: Tab, on_update: F) -> Result<Subscription>
    where
        F: Fn(PageBook, RemoteApply) + Send + Sync + 'static,
    {
        let remote = self.remote.as_ref().ok_or(SyncError::RemoteDisabled)?;
        let couple = self.local.couple_id()?;

        // Store writes are blocking file I/O; run them off the async workers,
        // one update at a time so arrival order is kept
        let (updates, mut incoming_updates) = mpsc::unbounded_channel::<PageBook>();
        let local = self.local.clone();
        let baselines = Arc::clone(&self.baselines);
        let key = (couple.clone(), tab);
        let on_update = Arc::new(on_update);
        tokio::spawn(async move {
            while let Some(incoming) = incoming_updates.recv().await {
                let local = local.clone();
                let baselines = Arc::clone(&baselines);
                let key = key.clone();
                let on_update = Arc::clone(&on_update);
                let applied = tokio::task::spawn_blocking(move || {
                    let outcome = apply_remote(&local, &baselines, &key, &incoming);
                    on_update(incoming, outcome);
                })
                .await;
                if let Err(e) = applied {
                    warn!(error = %e, "Failed to apply cloud update");
                }
            }
        });

        let subscription = remote
            .subscribe(
                &couple,
                tab,
                Box::new(move |incoming: PageBook| {
                    let _ = updates.send(incoming);
                }),
            )
            .await?;

        info!(
            tab = tab.remote_label(),
            location = subscription.label(),
            "Watching cloud updates"
        );
        Ok(subscription)
    }

    /// Checks whether the cloud answers
    pub async fn is_connected(&self) -> bool {
        match &self.remote {
            Some(remote) => remote.is_connected().await,
            None => false,
        }
    }

    fn remember(&self, couple: &CoupleId, tab: Tab, book: &PageBook) {
        self.baselines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((couple.clone(), tab), book.clone());
    }
}

/// Writes a pushed collection to local storage and classifies the overwrite
fn apply_remote(
    local: &LocalRepository,
    baselines: &Baselines,
    key: &(CoupleId, Tab),
    incoming: &PageBook,
) -> RemoteApply {
    let tab = key.1;
    let current = match local.load_pages(tab) {
        Ok(current) => current,
        Err(e) => {
            warn!(error = %e, "Failed to read local pages before applying update");
            None
        }
    };

    let mut baselines = baselines.lock().unwrap_or_else(PoisonError::into_inner);
    let outcome = match (&current, baselines.get(key)) {
        (Some(current), _) if current == incoming => RemoteApply::Unchanged,
        (Some(current), Some(baseline)) if current != baseline => RemoteApply::OverwroteLocalEdits,
        (Some(current), None) if current.filled_count() > 0 => RemoteApply::OverwroteLocalEdits,
        _ => RemoteApply::Applied,
    };

    if outcome != RemoteApply::Unchanged {
        if let Err(e) = local.save_pages(tab, incoming) {
            warn!(error = %e, "Failed to store cloud update locally");
        }
    }
    baselines.insert(key.clone(), incoming.clone());

    if outcome == RemoteApply::OverwroteLocalEdits {
        warn!(
            tab = tab.remote_label(),
            "Cloud update replaced local edits that were never synced"
        );
    }
    outcome
}
