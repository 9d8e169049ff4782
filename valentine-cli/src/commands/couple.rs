//! Couple command handlers

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;

use super::notify_success;
use crate::config::Config;

/// Couple subcommands
#[derive(Subcommand)]
pub enum CoupleCommands {
    /// Show your couple ID to share with your partner
    Show,
    /// Use your partner's couple ID
    Join {
        /// Couple ID shared by your partner
        id: String,
    },
}

/// Handle couple commands
pub async fn handle_couple_command(command: CoupleCommands, config: &Config) -> Result<()> {
    let valentine = config.open()?;
    let couple = valentine.couple();

    match command {
        CoupleCommands::Show => {
            let id = couple.current().context("Failed to read couple ID")?;
            println!("{}", "Your couple ID:".bold());
            println!("  {}", id.as_str().cyan());
            println!();
            println!(
                "{}",
                "Share this ID with your partner so you both see the same pages.".dimmed()
            );
            if !valentine.sync().remote_enabled() {
                println!(
                    "{}",
                    "Cloud sync is off; pages stay on this device.".yellow()
                );
            }
        }
        CoupleCommands::Join { id } => {
            let id = couple.join(&id).context("Failed to join couple")?;
            notify_success(&format!("Connected to {}", id));
        }
    }

    Ok(())
}
