//! Remote repository
//!
//! Mirrors page books to the shared cloud record of a couple. Writes replace
//! the whole record of a tab; whoever writes last wins.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use valentine_client::snapshot::normalize_array;
use valentine_client::{ClientError, CloudClient, Snapshot};
use valentine_core::domain::couple::CoupleId;
use valentine_core::domain::pages::PageBook;
use valentine_core::domain::tab::Tab;
use valentine_core::dto::record::{RemoteRecord, couple_path, pages_path, tab_path};

use super::subscription::Subscription;
use crate::error::{Result, SyncError};

/// Callback receiving every full page collection pushed by the remote
pub type UpdateCallback = Box<dyn Fn(PageBook) + Send + Sync + 'static>;

/// Repository trait for the shared cloud record
#[async_trait]
pub trait RemoteRepository: Send + Sync {
    /// Replaces the remote record of a tab with the given pages
    async fn save_pages(&self, couple: &CoupleId, tab: Tab, book: &PageBook) -> Result<()>;

    /// Fetches the pages of a tab once
    ///
    /// # Returns
    /// `None` when no record exists or the stored pages are malformed
    async fn load_pages(&self, couple: &CoupleId, tab: Tab) -> Result<Option<PageBook>>;

    /// Delivers every future full page collection of a tab to `callback`
    /// until the returned subscription is released
    async fn subscribe(
        &self,
        couple: &CoupleId,
        tab: Tab,
        callback: UpdateCallback,
    ) -> Result<Subscription>;

    /// Raw contents of the couple's whole record
    async fn export_couple(&self, couple: &CoupleId) -> Result<Option<Value>>;

    /// Deletes the couple's whole record
    async fn clear_couple(&self, couple: &CoupleId) -> Result<()>;

    /// Whether the remote answers requests
    async fn is_connected(&self) -> bool;
}

/// Cloud database implementation of RemoteRepository
#[derive(Debug, Clone)]
pub struct CloudRemote {
    client: CloudClient,
}

impl CloudRemote {
    pub fn new(client: CloudClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RemoteRepository for CloudRemote {
    async fn save_pages(&self, couple: &CoupleId, tab: Tab, book: &PageBook) -> Result<()> {
        self.client
            .put(&tab_path(couple, tab), &RemoteRecord::new(book))
            .await?;

        info!(
            tab = tab.remote_label(),
            filled = book.filled_count(),
            "Synced pages to cloud"
        );
        Ok(())
    }

    async fn load_pages(&self, couple: &CoupleId, tab: Tab) -> Result<Option<PageBook>> {
        let value = self.client.get_value(&pages_path(couple, tab)).await?;
        if value.is_null() {
            info!(tab = tab.remote_label(), "No cloud data found");
            return Ok(None);
        }

        let book = PageBook::from_json_value(&normalize_array(&value));
        match &book {
            Some(book) => info!(
                tab = tab.remote_label(),
                filled = book.filled_count(),
                "Loaded pages from cloud"
            ),
            None => warn!(tab = tab.remote_label(), "Cloud pages are malformed, ignoring"),
        }
        Ok(book)
    }

    async fn subscribe(
        &self,
        couple: &CoupleId,
        tab: Tab,
        callback: UpdateCallback,
    ) -> Result<Subscription> {
        let path = pages_path(couple, tab);
        let mut stream = self.client.stream(&path).await?;

        let label = path.clone();
        let task = tokio::spawn(async move {
            let mut snapshot = Snapshot::new();

            while let Some(event) = stream.next_event().await {
                let event = match event {
                    Ok(event) => event,
                    Err(ClientError::StreamError(reason)) => {
                        warn!(%path, %reason, "Skipping malformed stream event");
                        continue;
                    }
                    Err(e) => {
                        warn!(%path, error = %e, "Subscription stream failed");
                        break;
                    }
                };

                if event.is_terminal() {
                    warn!(%path, ?event, "Subscription closed by server");
                    break;
                }

                if !snapshot.apply(&event) {
                    continue;
                }

                match PageBook::from_json_value(&snapshot.as_array_like()) {
                    Some(book) => {
                        info!(tab = tab.remote_label(), "Real-time update received");
                        callback(book);
                    }
                    None => debug!(%path, "Ignoring incomplete page snapshot"),
                }
            }

            debug!(%path, "Subscription stream ended");
        });

        Ok(Subscription::new(label, task))
    }

    async fn export_couple(&self, couple: &CoupleId) -> Result<Option<Value>> {
        let value = self.client.get_value(&couple_path(couple)).await?;
        Ok((!value.is_null()).then_some(value))
    }

    async fn clear_couple(&self, couple: &CoupleId) -> Result<()> {
        self.client.delete(&couple_path(couple)).await?;
        info!(couple_id = %couple, "Cleared cloud data");
        Ok(())
    }

    async fn is_connected(&self) -> bool {
        match self.client.shallow_get("").await {
            Ok(_) => true,
            Err(e) if e.is_unauthorized() => {
                warn!(error = %e, "Cloud database refused the auth token");
                false
            }
            Err(e) if e.is_server_error() => {
                warn!(error = %e, "Cloud database is unavailable");
                false
            }
            Err(e) => {
                warn!(error = %e, "Cloud connection check failed");
                false
            }
        }
    }
}

/// In-memory implementation of RemoteRepository
///
/// Behaves like a single shared database: every clone sees the same records
/// and subscribers are notified of every write. Writes and reads can be made
/// to fail to exercise fallback paths.
#[derive(Clone)]
pub struct MemoryRemote {
    records: Arc<Mutex<BTreeMap<String, Value>>>,
    updates: broadcast::Sender<(String, Value)>,
    online: Arc<AtomicBool>,
}

impl MemoryRemote {
    pub fn new() -> Self {
        let (updates, _) = broadcast::channel(64);
        Self {
            records: Arc::new(Mutex::new(BTreeMap::new())),
            updates,
            online: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Makes every subsequent request succeed or fail
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// Stores a raw record for a tab, bypassing validation
    pub fn put_raw(&self, couple: &CoupleId, tab: Tab, record: Value) {
        let path = tab_path(couple, tab);
        self.lock().insert(path.clone(), record.clone());
        let _ = self.updates.send((path, record));
    }

    /// Raw record stored for a tab
    pub fn get_raw(&self, couple: &CoupleId, tab: Tab) -> Option<Value> {
        self.lock().get(&tab_path(couple, tab)).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Value>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_online(&self) -> Result<()> {
        if self.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(ClientError::api_error(503, "remote is offline").into())
        }
    }
}

impl Default for MemoryRemote {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteRepository for MemoryRemote {
    async fn save_pages(&self, couple: &CoupleId, tab: Tab, book: &PageBook) -> Result<()> {
        self.ensure_online()?;
        let record =
            serde_json::to_value(RemoteRecord::new(book)).map_err(|e| SyncError::CorruptEntry {
                key: tab_path(couple, tab),
                reason: e.to_string(),
            })?;
        self.put_raw(couple, tab, record);
        Ok(())
    }

    async fn load_pages(&self, couple: &CoupleId, tab: Tab) -> Result<Option<PageBook>> {
        self.ensure_online()?;
        Ok(self
            .get_raw(couple, tab)
            .and_then(|record| PageBook::from_json_value(&record["pages"])))
    }

    async fn subscribe(
        &self,
        couple: &CoupleId,
        tab: Tab,
        callback: UpdateCallback,
    ) -> Result<Subscription> {
        self.ensure_online()?;
        let path = tab_path(couple, tab);
        let mut updates = self.updates.subscribe();

        let label = path.clone();
        let task = tokio::spawn(async move {
            loop {
                match updates.recv().await {
                    Ok((changed, record)) if changed == path => {
                        if let Some(book) = PageBook::from_json_value(&record["pages"]) {
                            callback(book);
                        }
                    }
                    Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        Ok(Subscription::new(label, task))
    }

    async fn export_couple(&self, couple: &CoupleId) -> Result<Option<Value>> {
        self.ensure_online()?;
        let prefix = format!("{}/", couple_path(couple));
        let tabs: Map<String, Value> = self
            .lock()
            .iter()
            .filter_map(|(path, record)| {
                path.strip_prefix(&prefix)
                    .map(|label| (label.to_string(), record.clone()))
            })
            .collect();
        Ok((!tabs.is_empty()).then_some(Value::Object(tabs)))
    }

    async fn clear_couple(&self, couple: &CoupleId) -> Result<()> {
        self.ensure_online()?;
        let prefix = format!("{}/", couple_path(couple));
        self.lock().retain(|path, _| !path.starts_with(&prefix));
        Ok(())
    }

    async fn is_connected(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn couple() -> CoupleId {
        CoupleId::parse("couple_test").unwrap()
    }

    fn book_with(index: usize, text: &str) -> PageBook {
        let mut book = PageBook::new();
        book.set(index, text).unwrap();
        book
    }

    #[tokio::test]
    async fn test_cloud_save_writes_full_record() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/couples/couple_test/her.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .expect(1)
            .mount(&server)
            .await;

        let remote = CloudRemote::new(CloudClient::new(server.uri()));
        remote
            .save_pages(&couple(), Tab::Hers, &book_with(2, "hi"))
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body["pages"][2], "hi");
        assert_eq!(body["pages"].as_array().unwrap().len(), 100);
        assert!(body["updatedAt"].is_i64());
        assert!(body["lastModified"].is_string());
    }

    #[tokio::test]
    async fn test_cloud_load_rejects_wrong_length() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/couples/couple_test/my/pages.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(["a", "b"])))
            .mount(&server)
            .await;

        let remote = CloudRemote::new(CloudClient::new(server.uri()));
        assert_eq!(remote.load_pages(&couple(), Tab::Mine).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_cloud_load_absent_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("null"))
            .mount(&server)
            .await;

        let remote = CloudRemote::new(CloudClient::new(server.uri()));
        assert_eq!(remote.load_pages(&couple(), Tab::Hers).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_cloud_load_huge_index_keys_is_none() {
        for body in [
            json!({"18446744073709551615": "x"}),
            json!({"0": "a", "99999999999999": "x"}),
        ] {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/couples/couple_test/my/pages.json"))
                .respond_with(ResponseTemplate::new(200).set_body_json(body))
                .mount(&server)
                .await;

            let remote = CloudRemote::new(CloudClient::new(server.uri()));
            assert_eq!(remote.load_pages(&couple(), Tab::Mine).await.unwrap(), None);
        }
    }

    #[tokio::test]
    async fn test_cloud_subscription_skips_huge_index_keys() {
        let server = MockServer::start().await;
        let full = serde_json::to_string(&json!({"path": "/", "data": vec![""; 100]})).unwrap();
        let body = format!(
            "event: put\ndata: {{\"path\":\"/\",\"data\":{{\"18446744073709551615\":\"x\"}}}}\n\n\
             event: put\ndata: {}\n\n",
            full
        );
        Mock::given(method("GET"))
            .and(path("/couples/couple_test/her/pages.json"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
            .mount(&server)
            .await;

        let remote = CloudRemote::new(CloudClient::new(server.uri()));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut subscription = remote
            .subscribe(
                &couple(),
                Tab::Hers,
                Box::new(move |book| {
                    let _ = tx.send(book);
                }),
            )
            .await
            .unwrap();

        subscription.closed().await;
        assert_eq!(rx.recv().await.unwrap(), PageBook::new());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_cloud_subscription_delivers_snapshots() {
        let server = MockServer::start().await;
        let full = serde_json::to_string(&json!({"path": "/", "data": vec![""; 100]})).unwrap();
        let body = format!(
            "event: put\ndata: {}\n\nevent: put\ndata: {{\"path\":\"/7\",\"data\":\"seven\"}}\n\n",
            full
        );
        Mock::given(method("GET"))
            .and(path("/couples/couple_test/my/pages.json"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
            .mount(&server)
            .await;

        let remote = CloudRemote::new(CloudClient::new(server.uri()));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut subscription = remote
            .subscribe(
                &couple(),
                Tab::Mine,
                Box::new(move |book| {
                    let _ = tx.send(book);
                }),
            )
            .await
            .unwrap();

        assert_eq!(rx.recv().await.unwrap(), PageBook::new());
        assert_eq!(rx.recv().await.unwrap(), book_with(7, "seven"));
        subscription.closed().await;
    }

    #[tokio::test]
    async fn test_cloud_connection_check() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"couples": true})))
            .mount(&server)
            .await;
        let remote = CloudRemote::new(CloudClient::new(server.uri()));
        assert!(remote.is_connected().await);

        for status in [401, 503] {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .respond_with(ResponseTemplate::new(status).set_body_string("{\"error\":\"no\"}"))
                .mount(&server)
                .await;
            let remote = CloudRemote::new(CloudClient::new(server.uri()));
            assert!(!remote.is_connected().await);
        }
    }

    #[tokio::test]
    async fn test_memory_remote_subscription_and_export() {
        let remote = MemoryRemote::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let subscription = remote
            .subscribe(
                &couple(),
                Tab::Hers,
                Box::new(move |book| {
                    let _ = tx.send(book);
                }),
            )
            .await
            .unwrap();

        remote
            .save_pages(&couple(), Tab::Mine, &book_with(0, "mine"))
            .await
            .unwrap();
        remote
            .save_pages(&couple(), Tab::Hers, &book_with(1, "hers"))
            .await
            .unwrap();

        let received = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(received, book_with(1, "hers"));
        subscription.unsubscribe();

        let exported = remote.export_couple(&couple()).await.unwrap().unwrap();
        assert_eq!(exported["my"]["pages"][0], "mine");
        assert_eq!(exported["her"]["pages"][1], "hers");

        remote.clear_couple(&couple()).await.unwrap();
        assert!(remote.export_couple(&couple()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_remote_offline() {
        let remote = MemoryRemote::new();
        remote.set_online(false);
        assert!(!remote.is_connected().await);
        assert!(remote.load_pages(&couple(), Tab::Mine).await.is_err());
    }
}
