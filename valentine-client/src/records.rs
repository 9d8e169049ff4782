//! Database location endpoints

use futures::StreamExt;
use reqwest::Method;
use reqwest::header::ACCEPT;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::CloudClient;
use crate::error::{ClientError, Result};
use crate::stream::EventStream;

impl CloudClient {
    // =============================================================================
    // Reads & Writes
    // =============================================================================

    /// Replace the value stored at a path
    ///
    /// Whatever was stored before is overwritten entirely; there is no merge
    /// and no concurrency check.
    ///
    /// # Arguments
    /// * `path` - Database path (e.g., "couples/abc/my")
    /// * `value` - The value to store
    pub async fn put<T: Serialize + ?Sized>(&self, path: &str, value: &T) -> Result<()> {
        debug!(path, "PUT database location");
        let response = self.request(Method::PUT, path).json(value).send().await?;

        self.handle_empty_response(response).await
    }

    /// Read the value stored at a path
    ///
    /// # Returns
    /// `None` when nothing is stored there, otherwise the decoded value
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        let value = self.get_value(path).await?;
        if value.is_null() {
            return Ok(None);
        }

        serde_json::from_value(value)
            .map(Some)
            .map_err(|e| ClientError::ParseError(format!("Unexpected value at {}: {}", path, e)))
    }

    /// Read the raw JSON stored at a path (`Value::Null` when absent)
    pub async fn get_value(&self, path: &str) -> Result<Value> {
        debug!(path, "GET database location");
        let response = self.request(Method::GET, path).send().await?;

        self.handle_value(response).await
    }

    /// Read only the child keys of a path
    ///
    /// Children are reported as `true` instead of their full contents.
    pub async fn shallow_get(&self, path: &str) -> Result<Value> {
        let response = self
            .request(Method::GET, path)
            .query(&[("shallow", "true")])
            .send()
            .await?;

        self.handle_value(response).await
    }

    /// Delete whatever is stored at a path
    pub async fn delete(&self, path: &str) -> Result<()> {
        debug!(path, "DELETE database location");
        let response = self.request(Method::DELETE, path).send().await?;

        self.handle_empty_response(response).await
    }

    // =============================================================================
    // Streaming
    // =============================================================================

    /// Follow a path as a server-sent event stream
    ///
    /// The first event carries the current value; later events describe
    /// every change until the stream is dropped.
    pub async fn stream(&self, path: &str) -> Result<EventStream> {
        debug!(path, "Opening event stream");
        let response = self
            .request(Method::GET, path)
            .header(ACCEPT, "text/event-stream")
            .send()
            .await?;

        let response = self.check_status(response).await?;
        let bytes = response
            .bytes_stream()
            .map(|chunk| chunk.map(|b| b.to_vec()).map_err(ClientError::from));

        Ok(EventStream::new(bytes))
    }
}
