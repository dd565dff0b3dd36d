//! Show command - list one function's cached entries

use super::open_store;
use crate::cli::args::{OutputFormat, ShowArgs};
use crate::config::Config;
use crate::error::PrecacheResult;
use crate::key::NAMESPACE_SEPARATOR;
use crate::ui::{self, UiContext};
use console::style;

/// Execute the show command
pub async fn execute(args: ShowArgs, config: &Config) -> PrecacheResult<()> {
    let store = open_store(config).load(&args.function).await?;

    let mut entries: Vec<_> = store.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    if entries.is_empty() {
        match args.format {
            OutputFormat::Json => println!("{{}}"),
            OutputFormat::Plain => {}
            OutputFormat::Table => {
                let ctx = UiContext::detect();
                ui::step_info(&ctx, &format!("No cached entries for {}", args.function));
            }
        }
        return Ok(());
    }

    match args.format {
        OutputFormat::Table => {
            println!(
                "{:<48} {}",
                style("ARGUMENTS").bold(),
                style("RESULT").bold()
            );
            println!("{}", "-".repeat(80));
            let prefix = format!("{}{}", args.function, NAMESPACE_SEPARATOR);
            for (key, value) in &entries {
                let arguments = key.as_str().strip_prefix(&prefix).unwrap_or(key.as_str());
                println!("{:<48} {}", arguments, truncate(&value.to_string(), 60));
            }
            println!();
            println!("{} entries", entries.len());
        }
        OutputFormat::Json => {
            let map: serde_json::Map<String, serde_json::Value> = entries
                .into_iter()
                .map(|(k, v)| (k.as_str().to_string(), v.clone()))
                .collect();
            println!("{}", serde_json::to_string_pretty(&map)?);
        }
        OutputFormat::Plain => {
            for (key, _) in &entries {
                println!("{}", key);
            }
        }
    }

    Ok(())
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", cut)
}
