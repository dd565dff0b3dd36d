//! Status command - summarize the store

use super::open_store;
use crate::config::Config;
use crate::error::PrecacheResult;
use chrono::{DateTime, Local};
use console::{style, Emoji};

static CHECK: Emoji<'_, '_> = Emoji("✓ ", "[OK] ");
static WARN: Emoji<'_, '_> = Emoji("⚠ ", "[WARN] ");

/// Execute the status command
pub async fn execute(config: &Config) -> PrecacheResult<()> {
    let store = open_store(config);
    let path = store.path();

    println!("{}", style("Precache Store Status").bold().cyan());
    println!();
    println!("{}", style("Store:").bold());
    println!("  Path: {}", path.display());

    match tokio::fs::metadata(path).await {
        Ok(meta) => {
            let modified = meta
                .modified()
                .map(|t| DateTime::<Local>::from(t).format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|_| "unknown".to_string());
            println!("  {} {} bytes, modified {}", CHECK, meta.len(), modified);
        }
        Err(_) => {
            println!(
                "  {} {} - no precomputation has run yet",
                WARN,
                style("Not created").yellow()
            );
            return Ok(());
        }
    }

    let namespaces = store.namespaces().await?;

    println!();
    println!("{}", style("Functions:").bold());
    if namespaces.is_empty() {
        println!("  {}", style("No cached entries").dim());
        return Ok(());
    }

    for (function, count) in &namespaces {
        let state = if config.function(function).enabled {
            style("enabled").green()
        } else {
            style("disabled").dim()
        };
        println!("  {:<32} {:>8} entries  {}", function, count, state);
    }

    println!();
    println!(
        "{} function(s), {} entries",
        namespaces.len(),
        namespaces.values().sum::<usize>()
    );

    Ok(())
}
