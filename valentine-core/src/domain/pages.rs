//! Page book domain model
//!
//! A page book is the ordered collection of text entries behind one tab.
//! The position of a page is its only identity, so the collection always
//! holds exactly [`PAGE_COUNT`] entries.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CoreError, Result};

/// Number of pages in every tab
pub const PAGE_COUNT: usize = 100;

/// The fixed-size list of pages for one tab
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct PageBook {
    pages: Vec<String>,
}

impl PageBook {
    /// Creates a book with every page empty
    pub fn new() -> Self {
        Self {
            pages: vec![String::new(); PAGE_COUNT],
        }
    }

    /// Creates a book from an existing list of pages
    ///
    /// # Errors
    /// Returns [`CoreError::WrongPageCount`] unless exactly [`PAGE_COUNT`]
    /// pages are supplied.
    pub fn from_pages(pages: Vec<String>) -> Result<Self> {
        if pages.len() != PAGE_COUNT {
            return Err(CoreError::WrongPageCount {
                expected: PAGE_COUNT,
                actual: pages.len(),
            });
        }
        Ok(Self { pages })
    }

    /// Reads a book out of an untyped JSON value
    ///
    /// Only an array of exactly [`PAGE_COUNT`] elements is accepted. `null`
    /// elements are read as empty pages because the realtime database does
    /// not keep empty leaves. Any other element type rejects the value.
    pub fn from_json_value(value: &Value) -> Option<Self> {
        let items = value.as_array()?;
        if items.len() != PAGE_COUNT {
            return None;
        }

        let mut pages = Vec::with_capacity(PAGE_COUNT);
        for item in items {
            match item {
                Value::String(text) => pages.push(text.clone()),
                Value::Null => pages.push(String::new()),
                _ => return None,
            }
        }

        Some(Self { pages })
    }

    /// Parses a JSON document holding a page array
    pub fn from_json_str(raw: &str) -> Option<Self> {
        let value: Value = serde_json::from_str(raw).ok()?;
        Self::from_json_value(&value)
    }

    /// Text of a page, if the index is in range
    pub fn get(&self, index: usize) -> Option<&str> {
        self.pages.get(index).map(String::as_str)
    }

    /// Replaces the text of a page
    pub fn set(&mut self, index: usize, text: impl Into<String>) -> Result<()> {
        let total = self.pages.len();
        let slot = self
            .pages
            .get_mut(index)
            .ok_or(CoreError::PageOutOfRange { index, total })?;
        *slot = text.into();
        Ok(())
    }

    /// Empties a page
    pub fn clear(&mut self, index: usize) -> Result<()> {
        self.set(index, String::new())
    }

    /// Whether a page holds anything besides whitespace
    pub fn is_filled(&self, index: usize) -> bool {
        self.get(index).is_some_and(|text| !text.trim().is_empty())
    }

    /// Number of pages holding anything besides whitespace
    pub fn filled_count(&self) -> usize {
        self.pages.iter().filter(|p| !p.trim().is_empty()).count()
    }

    /// Number of pages (always [`PAGE_COUNT`])
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// A book is never empty; provided for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.pages
    }

    pub fn into_inner(self) -> Vec<String> {
        self.pages
    }
}

impl Default for PageBook {
    fn default() -> Self {
        Self::new()
    }
}

impl TryFrom<Vec<String>> for PageBook {
    type Error = CoreError;

    fn try_from(pages: Vec<String>) -> Result<Self> {
        Self::from_pages(pages)
    }
}

impl From<PageBook> for Vec<String> {
    fn from(book: PageBook) -> Self {
        book.pages
    }
}
