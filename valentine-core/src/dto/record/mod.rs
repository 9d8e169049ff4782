//! Cloud record DTOs
//!
//! The record stored at `couples/<couple-id>/<tab-label>`.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::couple::CoupleId;
use crate::domain::pages::PageBook;
use crate::domain::tab::Tab;

/// Root node under which every couple's record lives
pub const COUPLES_ROOT: &str = "couples";

/// Full replacement written for one tab
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteRecord {
    /// All pages of the tab
    pub pages: Vec<String>,

    /// Write time in milliseconds since the Unix epoch
    pub updated_at: i64,

    /// Write time as an RFC 3339 timestamp
    pub last_modified: String,
}

impl RemoteRecord {
    /// Builds a record stamped with the current time
    pub fn new(book: &PageBook) -> Self {
        Self::at(book, Utc::now())
    }

    /// Builds a record stamped with the given time
    pub fn at(book: &PageBook, now: DateTime<Utc>) -> Self {
        Self {
            pages: book.as_slice().to_vec(),
            updated_at: now.timestamp_millis(),
            last_modified: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

/// Path of the whole record of a couple
pub fn couple_path(couple: &CoupleId) -> String {
    format!("{}/{}", COUPLES_ROOT, couple.as_str())
}

/// Path of one tab's record
pub fn tab_path(couple: &CoupleId, tab: Tab) -> String {
    format!("{}/{}", couple_path(couple), tab.remote_label())
}

/// Path of the page list inside a tab's record
pub fn pages_path(couple: &CoupleId, tab: Tab) -> String {
    format!("{}/pages", tab_path(couple, tab))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_record_serializes_camel_case() {
        let now = Utc.with_ymd_and_hms(2025, 2, 14, 12, 0, 0).unwrap();
        let record = RemoteRecord::at(&PageBook::new(), now);
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(value["updatedAt"], 1_739_534_400_000_i64);
        assert_eq!(value["lastModified"], "2025-02-14T12:00:00.000Z");
        assert_eq!(value["pages"].as_array().unwrap().len(), 100);
    }

    #[test]
    fn test_paths() {
        let couple = CoupleId::parse("couple_1_abc").unwrap();
        assert_eq!(couple_path(&couple), "couples/couple_1_abc");
        assert_eq!(tab_path(&couple, Tab::Hers), "couples/couple_1_abc/her");
        assert_eq!(
            pages_path(&couple, Tab::Mine),
            "couples/couple_1_abc/my/pages"
        );
    }
}
