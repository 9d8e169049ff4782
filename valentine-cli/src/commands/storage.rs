//! Storage command handlers
//!
//! Handles storage statistics, availability checks, and clearing all data.

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use std::io::Write;
use valentine_core::domain::stats::StorageStats;
use valentine_core::domain::tab::Tab;

use super::{notify_success, notify_warning};
use crate::config::Config;

/// Storage subcommands
#[derive(Subcommand)]
pub enum StorageCommands {
    /// Show how many pages are written and how much space is used
    Stats,
    /// Delete every page locally and in the cloud
    Clear {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Check that local storage and the cloud are reachable
    Check,
}

/// Handle storage commands
///
/// # Arguments
/// * `command` - The storage command to execute
/// * `config` - The CLI configuration
pub async fn handle_storage_command(command: StorageCommands, config: &Config) -> Result<()> {
    let valentine = config.open()?;

    match command {
        StorageCommands::Stats => {
            let stats = valentine
                .backup()
                .stats()
                .context("Failed to read storage stats")?;
            print_stats(&stats);
        }
        StorageCommands::Clear { yes } => {
            if !yes && !confirm("Delete all pages? This cannot be undone.")? {
                println!("{}", "Cancelled.".dimmed());
                return Ok(());
            }

            let outcome = valentine
                .backup()
                .clear_all()
                .await
                .context("Failed to clear data")?;
            notify_success("All data cleared");
            if valentine.sync().remote_enabled() && !outcome.remote_cleared {
                notify_warning("Cloud data could not be cleared");
            }
        }
        StorageCommands::Check => {
            let local = valentine.backup().is_available();
            println!("  Local storage:  {}", availability(local));

            if valentine.sync().remote_enabled() {
                let connected = valentine.sync().is_connected().await;
                println!("  Cloud sync:     {}", availability(connected));
            } else {
                println!("  Cloud sync:     {}", "disabled".dimmed());
            }
        }
    }

    Ok(())
}

fn print_stats(stats: &StorageStats) {
    println!("{}", "Storage".bold());
    for tab in Tab::ALL {
        let filled = stats.get(tab).map_or(0, |s| s.filled_pages);
        let total = stats.get(tab).map_or(0, |s| s.total_pages);
        println!(
            "  {} {:<8} {}/{} pages",
            "▸".cyan(),
            tab.display_name(),
            filled,
            total
        );
    }
    println!(
        "  {} {:<8} {}/{} pages",
        "▸".cyan(),
        "Total",
        stats.total_filled(),
        StorageStats::capacity()
    );
    println!("  Used:        {}", stats.size.formatted().dimmed());
}

fn availability(ok: bool) -> ColoredString {
    if ok {
        "available".green()
    } else {
        "unavailable".red()
    }
}

fn confirm(question: &str) -> Result<bool> {
    print!("{} [y/N] ", question.yellow());
    std::io::stdout().flush()?;

    let mut answer = String::new();
    std::io::stdin()
        .read_line(&mut answer)
        .context("Failed to read confirmation")?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}
