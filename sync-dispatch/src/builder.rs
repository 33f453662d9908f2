//! Payload construction.
//!
//! How a payload is serialized from application state is outside the
//! dispatcher. It only needs bytes, built inside the read transaction it
//! also reads the prior fingerprint from.

use async_trait::async_trait;
use sync_store::{ReadTransaction, StorageError};
use sync_types::SyncKind;
use thiserror::Error;

use crate::request::PayloadSource;

/// Payload build errors.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Reading application state failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Serializing application state failed.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// Reading state from outside the store failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Builds the serialized sync payload for a kind.
#[async_trait]
pub trait PayloadBuilder: Send + Sync {
    /// Serialize the payload for `kind` from `source`.
    ///
    /// `Ok(None)` (or an empty payload) means there is nothing to send and
    /// resolves the request as a build failure.
    async fn build(
        &self,
        kind: SyncKind,
        source: &PayloadSource,
        txn: &mut ReadTransaction,
    ) -> Result<Option<Vec<u8>>, BuildError>;
}

/// Builder for callers that serialize their own payloads.
///
/// Returns [`PayloadSource::Inline`] bytes as-is and nothing otherwise.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlinePayloadBuilder;

#[async_trait]
impl PayloadBuilder for InlinePayloadBuilder {
    async fn build(
        &self,
        _kind: SyncKind,
        source: &PayloadSource,
        _txn: &mut ReadTransaction,
    ) -> Result<Option<Vec<u8>>, BuildError> {
        match source {
            PayloadSource::Inline(bytes) => Ok(Some(bytes.clone())),
            PayloadSource::Current | PayloadSource::Record(_) => Ok(None),
        }
    }
}
