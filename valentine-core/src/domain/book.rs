//! Book cursor
//!
//! Tracks the page a reader is looking at and derives what the pager shows:
//! the page number, the placeholder for an empty page, and the strip of
//! nearby page dots.

use super::pages::PAGE_COUNT;

/// Maximum number of page dots shown at once
pub const DOT_WINDOW: usize = 10;

/// Text shown on the final page while it is empty
pub const FINAL_PAGE_DEFAULT: &str = "I Love You Forever ❤️";

/// Position within a book
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookCursor {
    current: usize,
    total: usize,
}

impl BookCursor {
    /// Cursor at the first page of a standard book
    pub fn new() -> Self {
        Self::with_total(PAGE_COUNT)
    }

    /// Cursor at the first page of a book with `total` pages
    pub fn with_total(total: usize) -> Self {
        Self {
            current: 0,
            total,
        }
    }

    /// Zero-based index of the current page
    pub fn current(&self) -> usize {
        self.current
    }

    /// One-based page number of the current page
    pub fn page_number(&self) -> usize {
        self.current + 1
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn is_first_page(&self) -> bool {
        self.current == 0
    }

    /// The last page carries the closing message
    pub fn is_final_page(&self) -> bool {
        self.total > 0 && self.current == self.total - 1
    }

    /// Turns forward one page. Returns `false` on the last page.
    pub fn next(&mut self) -> bool {
        if self.current + 1 < self.total {
            self.current += 1;
            true
        } else {
            false
        }
    }

    /// Turns back one page. Returns `false` on the first page.
    pub fn prev(&mut self) -> bool {
        if self.current > 0 {
            self.current -= 1;
            true
        } else {
            false
        }
    }

    /// Jumps to a page by zero-based index. Out-of-range indices are ignored.
    pub fn goto(&mut self, index: usize) -> bool {
        if index >= self.total {
            return false;
        }
        self.current = index;
        true
    }

    /// Indices of the page dots around the current page
    ///
    /// At most [`DOT_WINDOW`] dots are shown, starting four pages before the
    /// current one and sliding so the window never runs past either end.
    pub fn dot_window(&self) -> Vec<usize> {
        let shown = DOT_WINDOW.min(self.total);
        let start = self
            .current
            .saturating_sub(4)
            .min(self.total.saturating_sub(DOT_WINDOW));
        (start..start + shown).collect()
    }

    /// Whether more pages follow beyond the dot window
    pub fn has_more_after(&self) -> bool {
        self.total > DOT_WINDOW && self.current + 6 < self.total
    }

    /// Text to show for a page with the given content
    pub fn display_text<'a>(&self, content: &'a str) -> std::borrow::Cow<'a, str> {
        if !content.is_empty() {
            return std::borrow::Cow::Borrowed(content);
        }
        std::borrow::Cow::Owned(placeholder(self.page_number(), self.is_final_page()))
    }
}

impl Default for BookCursor {
    fn default() -> Self {
        Self::new()
    }
}

/// Placeholder shown for an empty page
pub fn placeholder(page_number: usize, is_final: bool) -> String {
    if is_final {
        FINAL_PAGE_DEFAULT.to_string()
    } else {
        format!("Page {} - Click edit to add your message", page_number)
    }
}

/// Prompt shown while editing an empty page
pub fn edit_prompt(page_number: usize, is_final: bool) -> String {
    if is_final {
        "Your final message of love...".to_string()
    } else {
        format!("Write something lovely for page {}...", page_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_navigation_clamps() {
        let mut cursor = BookCursor::with_total(3);
        assert!(!cursor.prev());
        assert!(cursor.next());
        assert!(cursor.next());
        assert!(cursor.is_final_page());
        assert!(!cursor.next());
        assert_eq!(cursor.page_number(), 3);
        assert!(cursor.prev());
        assert!(cursor.prev());
        assert!(cursor.is_first_page());
    }

    #[test]
    fn test_goto() {
        let mut cursor = BookCursor::new();
        assert!(cursor.goto(50));
        assert_eq!(cursor.current(), 50);
        assert!(!cursor.goto(100));
        assert_eq!(cursor.current(), 50);
    }

    #[test]
    fn test_dot_window_at_start() {
        let cursor = BookCursor::new();
        assert_eq!(cursor.dot_window(), (0..10).collect::<Vec<_>>());
        assert!(cursor.has_more_after());
    }

    #[test]
    fn test_dot_window_in_middle_and_end() {
        let mut cursor = BookCursor::new();
        cursor.goto(50);
        assert_eq!(cursor.dot_window(), (46..56).collect::<Vec<_>>());

        cursor.goto(99);
        assert_eq!(cursor.dot_window(), (90..100).collect::<Vec<_>>());
        assert!(!cursor.has_more_after());

        cursor.goto(93);
        assert!(cursor.has_more_after());
        cursor.goto(94);
        assert!(!cursor.has_more_after());
    }

    #[test]
    fn test_dot_window_small_book() {
        let mut cursor = BookCursor::with_total(4);
        cursor.goto(3);
        assert_eq!(cursor.dot_window(), vec![0, 1, 2, 3]);
        assert!(!cursor.has_more_after());
    }

    #[test]
    fn test_placeholders() {
        let mut cursor = BookCursor::new();
        assert_eq!(
            cursor.display_text(""),
            "Page 1 - Click edit to add your message"
        );
        assert_eq!(cursor.display_text("hi"), "hi");
        cursor.goto(99);
        assert_eq!(cursor.display_text(""), FINAL_PAGE_DEFAULT);
        assert_eq!(edit_prompt(7, false), "Write something lovely for page 7...");
    }
}
