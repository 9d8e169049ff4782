//! Common types used across CLI modules

use std::str::FromStr;

use valentine_core::domain::pages::PAGE_COUNT;

/// One-based page number as typed by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageNumber(usize);

impl PageNumber {
    /// Zero-based index into the book
    pub fn index(&self) -> usize {
        self.0 - 1
    }

    pub fn get(&self) -> usize {
        self.0
    }
}

impl FromStr for PageNumber {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let number: usize = s
            .trim()
            .parse()
            .map_err(|_| format!("'{}' is not a page number", s))?;

        if (1..=PAGE_COUNT).contains(&number) {
            Ok(PageNumber(number))
        } else {
            Err(format!("page must be between 1 and {}", PAGE_COUNT))
        }
    }
}

impl std::fmt::Display for PageNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_page_number() {
        let page: PageNumber = "1".parse().unwrap();
        assert_eq!(page.index(), 0);
        let page: PageNumber = " 100 ".parse().unwrap();
        assert_eq!(page.index(), 99);
        assert_eq!(page.to_string(), "100");
    }

    #[test]
    fn test_reject_out_of_range() {
        assert!("0".parse::<PageNumber>().is_err());
        assert!("101".parse::<PageNumber>().is_err());
        assert!("two".parse::<PageNumber>().is_err());
    }
}
