//! Error types for storage and sync operations

use thiserror::Error;
use valentine_client::ClientError;
use valentine_core::CoreError;

use crate::repository::StoreError;

/// Result type alias for sync operations
pub type Result<T> = std::result::Result<T, SyncError>;

/// Errors raised by repositories and services
#[derive(Debug, Error)]
pub enum SyncError {
    /// Local storage could not be read or written
    #[error("Local storage error: {0}")]
    Store(#[from] StoreError),

    /// A domain value was rejected
    #[error(transparent)]
    Domain(#[from] CoreError),

    /// The cloud database request failed
    #[error("Cloud sync error: {0}")]
    Remote(#[from] ClientError),

    /// A stored entry is not valid JSON
    #[error("Stored value for '{key}' is corrupt: {reason}")]
    CorruptEntry { key: String, reason: String },

    /// The operation needs the cloud database but none is configured
    #[error("Cloud sync is not configured")]
    RemoteDisabled,

    /// Configuration is invalid
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Filesystem error outside the key-value store
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
