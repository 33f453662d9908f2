//! Data directory layout and coordinator setup.
//!
//! ```text
//! <data-dir>/
//!   linksync.toml      optional config
//!   linksync.db        fingerprints and local thread
//!   state/<kind>       current payload per kind
//!   state/<kind>.d/<id> single records
//!   outbox/*.sync      spooled payloads
//! ```

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use sync_dispatch::{Config, OutboxTransport, SyncCoordinator};
use sync_store::SqliteStore;

use crate::state::StateDirBuilder;

const CONFIG_FILE: &str = "linksync.toml";
const STATE_DIR: &str = "state";

/// Resolved configuration for one data directory.
#[derive(Debug, Clone)]
pub struct Workspace {
    /// Data directory.
    pub data_dir: PathBuf,
    /// Configuration with paths resolved against `data_dir`.
    pub config: Config,
}

impl Workspace {
    /// Load the config for `data_dir`.
    ///
    /// An explicit `config` path must exist; otherwise `linksync.toml` in the
    /// data directory is used when present, and defaults when not.
    pub fn load(data_dir: &Path, config: Option<&Path>) -> Result<Self> {
        let config = match config {
            Some(path) => Config::from_file(path)?,
            None => {
                let default_path = data_dir.join(CONFIG_FILE);
                if default_path.exists() {
                    Config::from_file(&default_path)?
                } else {
                    Config::default()
                }
            }
        };

        Ok(Self {
            data_dir: data_dir.to_path_buf(),
            config: config.with_base_dir(data_dir),
        })
    }

    /// Directory the payload builder reads current state from.
    pub fn state_dir(&self) -> PathBuf {
        self.data_dir.join(STATE_DIR)
    }

    /// Outbox the coordinator spools payloads to.
    pub fn outbox(&self) -> OutboxTransport {
        OutboxTransport::new(&self.config.outbox.directory)
    }

    /// Open the store.
    pub async fn open_store(&self) -> Result<SqliteStore> {
        SqliteStore::from_config(&self.config.storage)
            .await
            .with_context(|| {
                format!(
                    "Failed to open store at {}",
                    self.config.storage.database.display()
                )
            })
    }

    /// Open a coordinator that builds from the state directory and spools to
    /// the outbox.
    pub async fn open_coordinator(&self) -> Result<SyncCoordinator<OutboxTransport>> {
        SyncCoordinator::open(
            &self.config,
            Arc::new(StateDirBuilder::new(self.state_dir())),
            self.outbox(),
        )
        .await
        .with_context(|| {
            format!(
                "Failed to open store at {}",
                self.config.storage.database.display()
            )
        })
    }
}
