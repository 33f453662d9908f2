//! Filesystem outbox transport.
//!
//! Writes each payload to its own file for a separate delivery process to
//! pick up. Used by the CLI.

use super::{MessageTransport, OutgoingSync, TransportError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Extension of outbox entries.
const ENTRY_EXTENSION: &str = "sync";

/// Transport that spools payloads into a directory.
///
/// Entries are named `<kind>-<thread>-<nanos>.sync` and written atomically
/// (temp file, then rename).
#[derive(Debug, Clone)]
pub struct OutboxTransport {
    directory: PathBuf,
}

impl OutboxTransport {
    /// Create an outbox rooted at `directory`. Created on first send.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// The outbox directory.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// List spooled entries, oldest first.
    pub async fn entries(&self) -> Result<Vec<PathBuf>, TransportError> {
        let mut dir = match tokio::fs::read_dir(&self.directory).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut entries = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == ENTRY_EXTENSION) {
                entries.push(path);
            }
        }
        entries.sort();
        Ok(entries)
    }

    fn entry_name(outgoing: &OutgoingSync) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        format!(
            "{}-{}-{:024}.{}",
            outgoing.kind, outgoing.thread, nanos, ENTRY_EXTENSION
        )
    }
}

#[async_trait]
impl MessageTransport for OutboxTransport {
    async fn send(&self, outgoing: OutgoingSync) -> Result<(), TransportError> {
        tokio::fs::create_dir_all(&self.directory).await?;

        let name = Self::entry_name(&outgoing);
        let path = self.directory.join(&name);
        let tmp = self.directory.join(format!(".{}.tmp", name));

        tokio::fs::write(&tmp, &outgoing.payload).await?;
        tokio::fs::rename(&tmp, &path).await?;

        tracing::debug!(
            "Spooled {} sync ({} bytes, {}) to {}",
            outgoing.kind,
            outgoing.payload.len(),
            outgoing.fingerprint,
            path.display()
        );
        Ok(())
    }
}
