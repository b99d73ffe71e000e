//! Jotter CLI
//!
//! Command-line interface for Jotter - local notes with paged listing.

use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use jotter_core::{Config, NoteStorage, NotesStore, StoreEvent};

mod commands;
mod editor;
mod output;

use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "jot")]
#[command(about = "Jotter - Local notes from the command line")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Use this config file instead of the default
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List notes, newest first
    #[command(alias = "ls")]
    List {
        /// Page to show (zero-based)
        #[arg(short, long, conflicts_with = "all")]
        page: Option<u32>,
        /// Notes per page (defaults to page_size from config)
        #[arg(short, long)]
        limit: Option<u32>,
        /// Load every page
        #[arg(short, long)]
        all: bool,
    },
    /// Show a note in full
    Show {
        /// Note ID (full or the short form shown by list)
        id: String,
    },
    /// Add a note
    #[command(alias = "create")]
    Add {
        /// Note title (opens editor if title or body is missing)
        #[arg(short = 'T', long)]
        title: Option<String>,
        /// Note description
        #[arg(short, long)]
        body: Option<String>,
    },
    /// Edit a note
    Edit {
        /// Note ID (full or the short form shown by list)
        id: String,
        /// New title
        #[arg(short = 'T', long)]
        title: Option<String>,
        /// New description
        #[arg(short, long)]
        body: Option<String>,
    },
    /// Delete a note
    #[command(alias = "rm")]
    Delete {
        /// Note ID (full or the short form shown by list)
        id: String,
    },
    /// Show database location and note count
    Status,
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, database_name, page_size, log_file)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));
    let config_path = cli.config.as_ref();

    // Config commands don't need the database
    if let Commands::Config { command } = &cli.command {
        return handle_config_command(command.clone(), config_path, &output);
    }

    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;
    init_logging(&config);

    let storage = Arc::new(NoteStorage::with_config(&config));
    if let Err(err) = storage.initialize().await {
        if let Some(hint) = err.recovery_suggestion() {
            eprintln!("{}", hint);
        }
        return Err(err).context("Failed to open notes database");
    }

    let mut store = NotesStore::new(storage);
    let mut events = store.subscribe();

    let result = run_command(cli.command, &mut store, &config, &output).await;

    // A failed store operation already told the user through its notice
    let notified = report_failures(&mut events, &output);
    match result {
        Err(err) if notified => {
            debug!("Command failed after notice: {:#}", err);
            std::process::exit(1);
        }
        other => other,
    }
}

async fn run_command(
    command: Commands,
    store: &mut NotesStore,
    config: &Config,
    output: &Output,
) -> Result<()> {
    match command {
        Commands::List { page, limit, all } => {
            let limit = limit.unwrap_or(config.page_size);
            commands::note::list(store, page, limit, all, output).await
        }
        Commands::Show { id } => commands::note::show(store, id, output).await,
        Commands::Add { title, body } => commands::note::add(store, title, body, output).await,
        Commands::Edit { id, title, body } => {
            commands::note::edit(store, id, title, body, output).await
        }
        Commands::Delete { id } => commands::note::delete(store, id, output).await,
        Commands::Status => commands::status::show(store, config, output).await,
        Commands::Config { .. } => unreachable!(), // Handled in main
    }
}

fn handle_config_command(
    command: Option<ConfigCommands>,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(config_path, output),
        Some(ConfigCommands::Set { key, value }) => {
            commands::config::set(key, value, config_path, output)
        }
    }
}

/// Print the notice of every failed operation; returns whether any failed
fn report_failures(events: &mut broadcast::Receiver<StoreEvent>, output: &Output) -> bool {
    let mut notified = false;
    loop {
        match events.try_recv() {
            Ok(StoreEvent::Failed { notice, .. }) => {
                output.notice(&notice);
                notified = true;
            }
            Ok(_) | Err(TryRecvError::Lagged(_)) => {}
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return notified,
        }
    }
}

/// Initialize logging
///
/// Only initializes if JOTTER_LOG environment variable is set.
/// Logs to file (config.log_file or default {data_dir}/debug.log).
fn init_logging(config: &Config) {
    let Ok(log_level) = std::env::var("JOTTER_LOG") else {
        return;
    };

    let log_path = config.log_path();
    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let log_file = match File::create(&log_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: Could not create log file {:?}: {}", log_path, e);
            return;
        }
    };

    let env_filter = EnvFilter::new(format!(
        "jotter_core={},jotter_cli={}",
        log_level, log_level
    ));

    // Ignore error if already initialized
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(log_file)
        .try_init();

    info!("Logging initialized to {:?}", log_path);
}
