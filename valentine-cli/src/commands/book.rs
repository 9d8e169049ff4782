//! Book command handlers
//!
//! Handles showing, listing and editing pages, plus the interactive reader.

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use valentine_core::domain::book::{BookCursor, edit_prompt};
use valentine_core::domain::pages::PageBook;
use valentine_core::domain::tab::Tab;
use valentine_sync::service::{LoadSource, SyncService};

use super::{notify_warning, report_save};
use crate::config::Config;
use crate::types::PageNumber;

/// Book subcommands
#[derive(Subcommand)]
pub enum BookCommands {
    /// Show one page
    Show {
        /// Tab: "mine" or "hers"
        tab: Tab,

        /// Page number (1-100)
        #[arg(short, long, default_value = "1")]
        page: PageNumber,
    },
    /// List every filled page of a tab
    List {
        /// Tab: "mine" or "hers"
        tab: Tab,
    },
    /// Write the text of a page
    Edit {
        /// Tab: "mine" or "hers"
        tab: Tab,

        /// Page number (1-100)
        page: PageNumber,

        /// New page text
        #[arg(required = true, trailing_var_arg = true)]
        text: Vec<String>,
    },
    /// Erase the text of a page
    Erase {
        /// Tab: "mine" or "hers"
        tab: Tab,

        /// Page number (1-100)
        page: PageNumber,
    },
    /// Page through a tab interactively
    Read {
        /// Tab: "mine" or "hers"
        tab: Tab,
    },
}

/// Handle book commands
///
/// Routes book subcommands to their respective handlers.
///
/// # Arguments
/// * `command` - The book command to execute
/// * `config` - The CLI configuration
pub async fn handle_book_command(command: BookCommands, config: &Config) -> Result<()> {
    let valentine = config.open()?;
    let sync = valentine.sync();

    match command {
        BookCommands::Show { tab, page } => show_page(sync, tab, page).await,
        BookCommands::List { tab } => list_pages(sync, tab).await,
        BookCommands::Edit { tab, page, text } => {
            edit_page(sync, tab, page, &text.join(" ")).await
        }
        BookCommands::Erase { tab, page } => edit_page(sync, tab, page, "").await,
        BookCommands::Read { tab } => read_book(sync, tab).await,
    }
}

/// Show a single page
async fn show_page(sync: &SyncService, tab: Tab, page: PageNumber) -> Result<()> {
    let loaded = sync.load(tab).await;
    report_source(loaded.source);

    let mut cursor = BookCursor::new();
    cursor.goto(page.index());
    print_page(tab, &loaded.book, &cursor);
    Ok(())
}

/// List every filled page
async fn list_pages(sync: &SyncService, tab: Tab) -> Result<()> {
    let loaded = sync.load(tab).await;
    report_source(loaded.source);
    let book = loaded.book;

    if book.filled_count() == 0 {
        println!("{}", format!("No pages written in {} yet.", tab.display_name()).yellow());
        return Ok(());
    }

    println!(
        "{}",
        format!(
            "{}: {} of {} pages written",
            tab.heading(),
            book.filled_count(),
            book.len()
        )
        .bold()
    );
    println!();
    for (index, text) in book.as_slice().iter().enumerate() {
        if book.is_filled(index) {
            println!("  {} {} {}", "▸".cyan(), format!("Page {}:", index + 1).bold(), text);
        }
    }
    Ok(())
}

/// Replace the text of a page
async fn edit_page(sync: &SyncService, tab: Tab, page: PageNumber, text: &str) -> Result<()> {
    let (_, outcome) = sync
        .edit_page(tab, page.index(), text)
        .await
        .with_context(|| format!("Failed to save page {}", page))?;
    report_save(outcome, sync.remote_enabled());
    Ok(())
}

/// A command typed into the interactive reader
#[derive(Debug, Clone, PartialEq, Eq)]
enum ReaderCommand {
    Next,
    Prev,
    Goto(PageNumber),
    Edit(String),
    Erase,
    Help,
    Quit,
}

impl ReaderCommand {
    fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        match word {
            "" | "n" | "next" => Some(Self::Next),
            "p" | "prev" => Some(Self::Prev),
            "g" | "goto" => rest.parse().ok().map(Self::Goto),
            "e" | "edit" if !rest.is_empty() => Some(Self::Edit(rest.to_string())),
            "x" | "erase" => Some(Self::Erase),
            "h" | "help" | "?" => Some(Self::Help),
            "q" | "quit" => Some(Self::Quit),
            _ => None,
        }
    }
}

/// Interactive pager over a tab
async fn read_book(sync: &SyncService, tab: Tab) -> Result<()> {
    let loaded = sync.load(tab).await;
    report_source(loaded.source);
    let mut book = loaded.book;
    let mut cursor = BookCursor::with_total(book.len());

    print_reader_help();
    print_page(tab, &book, &cursor);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{} ", ">".magenta().bold());
        std::io::stdout().flush().context("Failed to write prompt")?;

        let Some(line) = lines.next_line().await.context("Failed to read input")? else {
            break;
        };

        let Some(command) = ReaderCommand::parse(&line) else {
            notify_warning("Unknown command, type h for help");
            continue;
        };

        match command {
            ReaderCommand::Next => {
                if !cursor.next() {
                    notify_warning("This is the last page");
                    continue;
                }
            }
            ReaderCommand::Prev => {
                if !cursor.prev() {
                    notify_warning("This is the first page");
                    continue;
                }
            }
            ReaderCommand::Goto(page) => {
                cursor.goto(page.index());
            }
            ReaderCommand::Edit(text) => {
                save_current(sync, tab, &mut book, &cursor, text).await?;
            }
            ReaderCommand::Erase => {
                save_current(sync, tab, &mut book, &cursor, String::new()).await?;
            }
            ReaderCommand::Help => {
                print_reader_help();
                continue;
            }
            ReaderCommand::Quit => break,
        }

        print_page(tab, &book, &cursor);
    }

    Ok(())
}

async fn save_current(
    sync: &SyncService,
    tab: Tab,
    book: &mut PageBook,
    cursor: &BookCursor,
    text: String,
) -> Result<()> {
    book.set(cursor.current(), text)?;
    let outcome = sync
        .save(tab, book)
        .await
        .with_context(|| format!("Failed to save page {}", cursor.page_number()))?;
    report_save(outcome, sync.remote_enabled());
    Ok(())
}

fn print_reader_help() {
    println!(
        "{}",
        "n: next  p: previous  g N: go to page  e TEXT: edit  x: erase  q: quit".dimmed()
    );
}

/// Print a page with its heading and the dot strip
fn print_page(tab: Tab, book: &PageBook, cursor: &BookCursor) {
    let content = book.get(cursor.current()).unwrap_or_default();

    println!();
    println!("{}", tab.heading().magenta().bold());
    println!(
        "{}",
        format!("Page {} of {}", cursor.page_number(), cursor.total()).dimmed()
    );
    println!();
    if content.is_empty() {
        println!("  {}", cursor.display_text(content).italic().dimmed());
        println!(
            "  {}",
            edit_prompt(cursor.page_number(), cursor.is_final_page()).dimmed()
        );
    } else {
        println!("  {}", content);
    }
    println!();
    println!("  {}", dot_strip(cursor).red());
}

/// Dots for the pages around the current one, with a back marker once the
/// first page is behind
fn dot_strip(cursor: &BookCursor) -> String {
    let mut dots: Vec<&str> = Vec::new();
    if !cursor.is_first_page() {
        dots.push("‹");
    }
    dots.extend(
        cursor
            .dot_window()
            .into_iter()
            .map(|index| if index == cursor.current() { "●" } else { "○" }),
    );
    if cursor.has_more_after() {
        dots.push("…");
    }
    dots.join(" ")
}

fn report_source(source: LoadSource) {
    if source == LoadSource::Fresh {
        println!("{}", "Starting a fresh book.".dimmed());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reader_commands() {
        assert_eq!(ReaderCommand::parse(""), Some(ReaderCommand::Next));
        assert_eq!(ReaderCommand::parse("p"), Some(ReaderCommand::Prev));
        assert_eq!(
            ReaderCommand::parse("g 42"),
            Some(ReaderCommand::Goto("42".parse().unwrap()))
        );
        assert_eq!(
            ReaderCommand::parse("e  you make me laugh "),
            Some(ReaderCommand::Edit("you make me laugh".to_string()))
        );
        assert_eq!(ReaderCommand::parse("q"), Some(ReaderCommand::Quit));
    }

    #[test]
    fn test_reject_bad_reader_commands() {
        assert_eq!(ReaderCommand::parse("g 0"), None);
        assert_eq!(ReaderCommand::parse("g"), None);
        assert_eq!(ReaderCommand::parse("e"), None);
        assert_eq!(ReaderCommand::parse("dance"), None);
    }

    #[test]
    fn test_dot_strip() {
        let mut cursor = BookCursor::new();
        assert_eq!(dot_strip(&cursor), "● ○ ○ ○ ○ ○ ○ ○ ○ ○ …");

        cursor.goto(99);
        assert_eq!(dot_strip(&cursor), "‹ ○ ○ ○ ○ ○ ○ ○ ○ ○ ●");
    }
}
