//! Status command handler

use anyhow::Result;

use jotter_core::{Config, NotesStore};

use crate::output::{Output, OutputFormat};

/// Show where notes live and how many there are
pub async fn show(store: &NotesStore, config: &Config, output: &Output) -> Result<()> {
    let storage = store.storage();
    let count = storage.count().await?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "database": storage.location().to_string(),
                    "notes": count,
                    "page_size": config.page_size,
                    "config_file": Config::config_file_path(),
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", count);
        }
        OutputFormat::Human => {
            println!("Jotter Status");
            println!("=============");
            println!();
            println!("Storage:");
            println!("  Database:  {}", storage.location());
            println!("  Page size: {}", config.page_size);
            println!();
            println!("Contents:");
            println!("  Notes: {}", count);
        }
    }

    Ok(())
}
