//! Valentine Cloud Client
//!
//! A small, type-safe HTTP client for the realtime database REST API that
//! mirrors the Valentine book between partners.
//!
//! Every database location is addressed by a slash separated path and maps
//! to `<database_url>/<path>.json`. Locations can be written, read, deleted
//! and followed through a server-sent event stream.
//!
//! # Example
//!
//! ```no_run
//! use valentine_client::CloudClient;
//!
//! #[tokio::main]
//! async fn main() -> valentine_client::Result<()> {
//!     let client = CloudClient::new("https://example-rtdb.firebaseio.com");
//!
//!     client.put("couples/demo/my", &serde_json::json!({ "pages": [] })).await?;
//!     let pages: Option<Vec<String>> = client.get("couples/demo/my/pages").await?;
//!
//!     println!("Stored pages: {:?}", pages);
//!     Ok(())
//! }
//! ```

pub mod error;
mod records;
pub mod snapshot;
pub mod stream;

// Re-export commonly used types
pub use error::{ClientError, Result};
pub use snapshot::Snapshot;
pub use stream::{DatabaseEvent, EventStream, EventStreamDecoder, ServerEvent};

use reqwest::{Client, Method, RequestBuilder};

/// HTTP client for the realtime database
#[derive(Debug, Clone)]
pub struct CloudClient {
    /// Base URL of the database (e.g., "https://project-rtdb.firebaseio.com")
    database_url: String,
    /// Optional auth token appended to every request
    auth_token: Option<String>,
    /// HTTP client instance
    client: Client,
}

impl CloudClient {
    /// Create a new cloud client
    ///
    /// # Arguments
    /// * `database_url` - The base URL of the database
    ///
    /// # Example
    /// ```
    /// use valentine_client::CloudClient;
    ///
    /// let client = CloudClient::new("https://example-rtdb.firebaseio.com");
    /// ```
    pub fn new(database_url: impl Into<String>) -> Self {
        Self::with_client(database_url, Client::new())
    }

    /// Create a new cloud client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    ///
    /// # Arguments
    /// * `database_url` - The base URL of the database
    /// * `client` - A configured reqwest Client
    pub fn with_client(database_url: impl Into<String>, client: Client) -> Self {
        let database_url = database_url.into();
        Self {
            database_url: database_url.trim_end_matches('/').to_string(),
            auth_token: None,
            client,
        }
    }

    /// Attach an auth token sent as the `auth` query parameter
    pub fn with_auth(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.auth_token = (!token.is_empty()).then_some(token);
        self
    }

    /// Get the base URL of the database
    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    /// REST URL of a database path
    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}.json", self.database_url, path.trim_matches('/'))
    }

    /// Start a request against a database path, adding auth when configured
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, self.url_for(path));
        match &self.auth_token {
            Some(token) => builder.query(&[("auth", token.as_str())]),
            None => builder,
        }
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Check the status code of a response and turn failures into errors
    async fn check_status(&self, response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        Ok(response)
    }

    /// Handle a response and read its body as a JSON value
    async fn handle_value(&self, response: reqwest::Response) -> Result<serde_json::Value> {
        let response = self.check_status(response).await?;

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }

    /// Handle a response whose body is not needed
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<()> {
        self.check_status(response).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = CloudClient::new("https://db.example.com");
        assert_eq!(client.database_url(), "https://db.example.com");
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = CloudClient::new("https://db.example.com/");
        assert_eq!(client.database_url(), "https://db.example.com");
    }

    #[test]
    fn test_url_for_paths() {
        let client = CloudClient::new("https://db.example.com");
        assert_eq!(
            client.url_for("couples/abc/my"),
            "https://db.example.com/couples/abc/my.json"
        );
        assert_eq!(
            client.url_for("/couples/"),
            "https://db.example.com/couples.json"
        );
        assert_eq!(client.url_for(""), "https://db.example.com/.json");
    }

    #[test]
    fn test_empty_auth_token_is_ignored() {
        let client = CloudClient::new("https://db.example.com").with_auth("");
        assert!(client.auth_token.is_none());
    }
}
