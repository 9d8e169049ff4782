//! Watch command handler
//!
//! Follows cloud updates of a tab until interrupted.

use anyhow::{Context, Result};
use colored::*;
use valentine_core::domain::tab::Tab;
use valentine_sync::service::RemoteApply;

use super::notify_warning;
use crate::config::Config;

/// Follow a tab's cloud record and print every change
pub async fn watch_tab(tab: Tab, config: &Config) -> Result<()> {
    let valentine = config.open()?;
    let sync = valentine.sync();

    let loaded = sync.load(tab).await;
    println!(
        "{}",
        format!(
            "Watching {} ({} pages written). Press Ctrl-C to stop.",
            tab.display_name(),
            loaded.book.filled_count()
        )
        .bold()
    );

    let mut subscription = sync
        .watch(tab, move |book, outcome| {
            let stamp = chrono::Local::now().format("%H:%M:%S").to_string();
            match outcome {
                RemoteApply::Unchanged => {}
                RemoteApply::Applied => println!(
                    "{} {} pages written",
                    stamp.dimmed(),
                    book.filled_count().to_string().cyan()
                ),
                RemoteApply::OverwroteLocalEdits => {
                    println!(
                        "{} {} pages written",
                        stamp.dimmed(),
                        book.filled_count().to_string().cyan()
                    );
                    notify_warning("Unsynced local edits were replaced by your partner's version");
                }
            }
        })
        .await
        .context("Failed to subscribe to cloud updates")?;

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result.context("Failed to listen for Ctrl-C")?;
            println!();
        }
        _ = subscription.closed() => {
            notify_warning("Cloud connection closed");
        }
    }

    subscription.unsubscribe();
    Ok(())
}
