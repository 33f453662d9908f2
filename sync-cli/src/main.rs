//! # linksync
//!
//! CLI for firing sync triggers against a local data directory.
//!
//! Payloads are spooled to an outbox directory instead of a network
//! transport, which makes the dispatcher's debounce and deduplication
//! decisions easy to observe.
//!
//! ## Commands
//!
//! - `trigger`: Fire one trigger and wait for its outcome
//! - `listen`: Read triggers from stdin, one per line
//! - `status`: Show the local thread and last sent fingerprints
//! - `forget`: Clear the last sent fingerprint of a kind
//!
//! ## Example
//!
//! ```bash
//! # Routine contacts sync from the state directory
//! echo "alice,bob" > ~/.local/share/linksync/state/contacts
//! linksync trigger accounts-changed
//!
//! # Same content again is skipped
//! linksync trigger accounts-changed
//!
//! # Explicit sync with an inline payload
//! linksync trigger sync-groups --payload '{"groups":[]}'
//!
//! # Replay a burst of triggers
//! printf 'accounts-changed\naccounts-changed\napp-ready\n' | linksync listen
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use sync_dispatch::{SyncKind, Trigger};
use tracing_subscriber::EnvFilter;

mod commands;
mod state;
mod workspace;

use commands::{forget, listen, status, trigger};
use workspace::Workspace;

/// CLI for firing linksync triggers and inspecting sync state.
#[derive(Parser, Debug)]
#[command(name = "linksync")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Data directory for the store, state files and outbox
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Config file (default: <data-dir>/linksync.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fire one trigger and wait for its outcome
    Trigger {
        /// Trigger event
        event: TriggerEvent,

        /// Inline payload (instead of the state directory)
        #[arg(long, short, conflicts_with = "file")]
        payload: Option<String>,

        /// Read the payload from a file
        #[arg(long, short, conflicts_with = "payload")]
        file: Option<PathBuf>,

        /// Record id for `sync-local-record`
        #[arg(long, short)]
        record: Option<String>,
    },

    /// Read triggers from stdin, one per line, until EOF
    Listen,

    /// Show the local thread and last sent fingerprints
    Status {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Clear the last sent fingerprint so the next routine sync is sent
    Forget {
        /// Sync kind (contacts, configuration, groups)
        #[arg(value_parser = parse_kind)]
        kind: SyncKind,
    },
}

/// Trigger events accepted on the command line.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum TriggerEvent {
    AccountsChanged,
    ProfileKeyChanged,
    SyncAllContacts,
    SyncLocalRecord,
    AppReady,
    SettingsChanged,
    SyncGroups,
}

impl TriggerEvent {
    fn into_trigger(self, record: Option<String>) -> Result<Trigger> {
        let trigger = match self {
            Self::AccountsChanged => Trigger::AccountsChanged,
            Self::ProfileKeyChanged => Trigger::ProfileKeyChanged,
            Self::SyncAllContacts => Trigger::SyncAllContacts,
            Self::SyncLocalRecord => Trigger::SyncLocalRecord(
                record.context("sync-local-record requires --record <ID>")?,
            ),
            Self::AppReady => Trigger::AppReady,
            Self::SettingsChanged => Trigger::SettingsChanged,
            Self::SyncGroups => Trigger::SyncGroups,
        };
        Ok(trigger)
    }
}

fn parse_kind(s: &str) -> Result<SyncKind, String> {
    s.parse().map_err(|e: sync_types::ParseKindError| e.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Determine data directory
    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => default_data_dir()?,
    };

    // Ensure data directory exists
    tokio::fs::create_dir_all(&data_dir)
        .await
        .context("Failed to create data directory")?;

    let workspace = Workspace::load(&data_dir, cli.config.as_deref())?;

    match cli.command {
        Commands::Trigger {
            event,
            payload,
            file,
            record,
        } => {
            let payload = if let Some(text) = payload {
                Some(text.into_bytes())
            } else if let Some(path) = file {
                Some(
                    tokio::fs::read(&path)
                        .await
                        .with_context(|| format!("Failed to read {}", path.display()))?,
                )
            } else {
                None
            };
            let trigger = event.into_trigger(record)?;
            trigger::run(&workspace, trigger, payload).await?;
        }
        Commands::Listen => {
            listen::run(&workspace).await?;
        }
        Commands::Status { json } => {
            status::run(&workspace, json).await?;
        }
        Commands::Forget { kind } => {
            forget::run(&workspace, kind).await?;
        }
    }

    Ok(())
}

/// Get the default data directory for linksync.
fn default_data_dir() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("io", "linksync", "linksync")
        .context("Could not determine home directory")?;
    Ok(dirs.data_dir().to_path_buf())
}
