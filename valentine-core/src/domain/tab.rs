//! Tab domain model
//!
//! A book has two independent page collections, one written for each partner.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::CoreError;

/// One of the two page collections of the book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    /// Pages written for me
    Mine,

    /// Pages written for her
    Hers,
}

impl Tab {
    /// Both tabs, in display order
    pub const ALL: [Tab; 2] = [Tab::Mine, Tab::Hers];

    /// Label used in the cloud record path (`couples/<id>/<label>`)
    pub const fn remote_label(&self) -> &'static str {
        match self {
            Tab::Mine => "my",
            Tab::Hers => "her",
        }
    }

    /// Key under which the tab's pages are kept in local storage
    pub const fn storage_key(&self) -> &'static str {
        match self {
            Tab::Mine => "valentine-my-pages",
            Tab::Hers => "valentine-her-pages",
        }
    }

    /// Human readable tab title
    pub fn display_name(&self) -> &'static str {
        match self {
            Tab::Mine => "For Me",
            Tab::Hers => "For Her",
        }
    }

    /// Owner name used in the book header
    pub fn owner(&self) -> &'static str {
        match self {
            Tab::Mine => "My",
            Tab::Hers => "Her",
        }
    }

    /// Book header, e.g. "My's Love Notes"
    pub fn heading(&self) -> String {
        format!("{}'s Love Notes", self.owner())
    }

    /// Find the tab owning a local storage key
    pub fn from_storage_key(key: &str) -> Option<Tab> {
        Tab::ALL.into_iter().find(|tab| tab.storage_key() == key)
    }
}

impl FromStr for Tab {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "my" | "mine" | "me" => Ok(Tab::Mine),
            "her" | "hers" => Ok(Tab::Hers),
            other => Err(CoreError::UnknownTab(other.to_string())),
        }
    }
}

impl std::fmt::Display for Tab {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases() {
        assert_eq!("my".parse::<Tab>().unwrap(), Tab::Mine);
        assert_eq!("Me".parse::<Tab>().unwrap(), Tab::Mine);
        assert_eq!(" hers ".parse::<Tab>().unwrap(), Tab::Hers);
        assert!("theirs".parse::<Tab>().is_err());
    }

    #[test]
    fn test_storage_key_lookup() {
        assert_eq!(Tab::from_storage_key("valentine-her-pages"), Some(Tab::Hers));
        assert_eq!(Tab::from_storage_key("valentine-couple-id"), None);
    }

    #[test]
    fn test_heading() {
        assert_eq!(Tab::Mine.heading(), "My's Love Notes");
    }
}
