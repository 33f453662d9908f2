//! Payload builder backed by plain files.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use sync_dispatch::{BuildError, PayloadBuilder, PayloadSource, SyncKind};
use sync_store::ReadTransaction;

/// Reads the current payload of a kind from `<root>/<kind>` and single
/// records from `<root>/<kind>.d/<id>`. Missing files mean nothing to send.
#[derive(Debug, Clone)]
pub struct StateDirBuilder {
    root: PathBuf,
}

impl StateDirBuilder {
    /// Builder reading state files under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, kind: SyncKind, source: &PayloadSource) -> Result<Option<PathBuf>, BuildError> {
        match source {
            PayloadSource::Current => Ok(Some(self.root.join(kind.as_str()))),
            PayloadSource::Record(id) => {
                if id.is_empty() || id.contains(|c: char| c == '/' || c == '\\') || id.starts_with('.') {
                    return Err(BuildError::Serialization(format!("invalid record id: {:?}", id)));
                }
                Ok(Some(self.root.join(format!("{}.d", kind.as_str())).join(id)))
            }
            PayloadSource::Inline(_) => Ok(None),
        }
    }
}

async fn read_optional(path: &Path) -> Result<Option<Vec<u8>>, BuildError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No state at {}", path.display());
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

#[async_trait]
impl PayloadBuilder for StateDirBuilder {
    async fn build(
        &self,
        kind: SyncKind,
        source: &PayloadSource,
        _txn: &mut ReadTransaction,
    ) -> Result<Option<Vec<u8>>, BuildError> {
        if let PayloadSource::Inline(bytes) = source {
            return Ok(Some(bytes.clone()));
        }
        match self.path_for(kind, source)? {
            Some(path) => read_optional(&path).await,
            None => Ok(None),
        }
    }
}
