//! Error types for core domain operations

use thiserror::Error;

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised when domain values are constructed or modified
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// A page collection did not contain exactly the expected number of entries
    #[error("expected {expected} pages, got {actual}")]
    WrongPageCount {
        /// Number of pages a book must hold
        expected: usize,
        /// Number of pages that were supplied
        actual: usize,
    },

    /// A page index fell outside the book
    #[error("page index {index} is out of range (book has {total} pages)")]
    PageOutOfRange {
        /// Zero-based index that was requested
        index: usize,
        /// Number of pages in the book
        total: usize,
    },

    /// A couple identifier was empty after trimming
    #[error("couple ID cannot be empty")]
    EmptyCoupleId,

    /// A couple identifier contained a character that cannot appear in a
    /// database path
    #[error("couple ID cannot contain {0:?}")]
    InvalidCoupleId(char),

    /// A tab name could not be recognised
    #[error("unknown tab '{0}' (expected 'my' or 'her')")]
    UnknownTab(String),

    /// A backup document could not be parsed
    #[error("invalid backup: {0}")]
    InvalidBackup(String),
}
