//! Backup command handlers
//!
//! Handles exporting local data to a file, restoring it, and dumping the
//! couple's cloud record.

use anyhow::{Context, Result};
use clap::Subcommand;
use std::fs;
use std::path::PathBuf;

use super::{notify_success, notify_warning};
use crate::config::Config;

/// Backup subcommands
#[derive(Subcommand)]
pub enum BackupCommands {
    /// Export both tabs to a JSON backup file
    Export {
        /// Directory for the backup file
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Print the backup instead of writing a file
        #[arg(long)]
        stdout: bool,
    },
    /// Restore a JSON backup file
    Import {
        /// Path to the backup file
        file: PathBuf,
    },
    /// Print the couple's cloud record
    Cloud,
}

/// Handle backup commands
///
/// # Arguments
/// * `command` - The backup command to execute
/// * `config` - The CLI configuration
pub async fn handle_backup_command(command: BackupCommands, config: &Config) -> Result<()> {
    let valentine = config.open()?;
    let backup = valentine.backup();

    match command {
        BackupCommands::Export { output, stdout } => {
            if stdout {
                println!("{}", backup.export().context("Export failed")?);
            } else {
                let today = chrono::Local::now().date_naive();
                let path = backup
                    .export_to_file(&output, today)
                    .context("Export failed")?;
                notify_success(&format!("Data exported to {}", path.display()));
            }
        }
        BackupCommands::Import { file } => {
            let text = fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let restored = backup
                .import(&text)
                .context("Import failed: invalid backup file")?;
            notify_success(&format!("Data imported ({} entries restored)", restored));
        }
        BackupCommands::Cloud => {
            let record = backup
                .export_cloud()
                .await
                .context("Failed to read cloud data")?;
            match record {
                Some(value) => println!("{}", serde_json::to_string_pretty(&value)?),
                None => notify_warning("No cloud data for this couple"),
            }
        }
    }

    Ok(())
}
