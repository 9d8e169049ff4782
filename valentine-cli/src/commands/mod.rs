//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod backup;
mod book;
mod couple;
mod storage;
mod watch;

pub use backup::BackupCommands;
pub use book::BookCommands;
pub use couple::CoupleCommands;
pub use storage::StorageCommands;

use anyhow::Result;
use clap::Subcommand;
use colored::*;
use valentine_core::domain::tab::Tab;
use valentine_sync::service::SaveOutcome;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Read and write pages
    Book {
        #[command(subcommand)]
        command: BookCommands,
    },
    /// Show or change the shared couple ID
    Couple {
        #[command(subcommand)]
        command: CoupleCommands,
    },
    /// Export and import backups
    Backup {
        #[command(subcommand)]
        command: BackupCommands,
    },
    /// Inspect and clear local storage
    Storage {
        #[command(subcommand)]
        command: StorageCommands,
    },
    /// Follow your partner's edits as they happen
    Watch {
        /// Tab to follow: "mine" or "hers"
        tab: Tab,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
///
/// # Arguments
/// * `command` - The command to execute
/// * `config` - The CLI configuration
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Book { command } => book::handle_book_command(command, config).await,
        Commands::Couple { command } => couple::handle_couple_command(command, config).await,
        Commands::Backup { command } => backup::handle_backup_command(command, config).await,
        Commands::Storage { command } => storage::handle_storage_command(command, config).await,
        Commands::Watch { tab } => watch::watch_tab(tab, config).await,
    }
}

/// Print a success notification
fn notify_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message.green());
}

/// Print a warning notification
fn notify_warning(message: &str) {
    println!("{} {}", "!".yellow().bold(), message.yellow());
}

/// Report where a save landed
fn report_save(outcome: SaveOutcome, remote_enabled: bool) {
    if outcome.remote_synced {
        notify_success("Saved and synced!");
    } else if remote_enabled {
        notify_warning("Saved locally; cloud sync failed");
    } else {
        notify_success("Saved!");
    }
}
