//! Transport abstraction for outbound syncs.
//!
//! The dispatcher hands a finished payload and its destination thread to a
//! [`MessageTransport`] and waits for success or failure. How the bytes get to
//! the other devices is the transport's business.
//!
//! # Example
//!
//! ```ignore
//! let transport = MockTransport::new();
//! transport.send(OutgoingSync::new(SyncKind::Contacts, thread, payload)).await?;
//! assert_eq!(transport.sent_count(), 1);
//! ```

mod mock;
mod outbox;

pub use mock::MockTransport;
pub use outbox::OutboxTransport;

use async_trait::async_trait;
use sync_types::{Fingerprint, SyncKind, ThreadRef};
use thiserror::Error;

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Send failed.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// The transport was shut down.
    #[error("transport closed")]
    Closed,

    /// Send timed out.
    #[error("send timeout")]
    Timeout,

    /// Local I/O failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A payload addressed to the local sync thread.
#[derive(Clone, PartialEq, Eq)]
pub struct OutgoingSync {
    /// Kind of sync.
    pub kind: SyncKind,
    /// Destination thread.
    pub thread: ThreadRef,
    /// Serialized payload.
    pub payload: Vec<u8>,
    /// Fingerprint of `payload`.
    pub fingerprint: Fingerprint,
}

impl OutgoingSync {
    /// Create an outgoing sync, fingerprinting the payload.
    pub fn new(kind: SyncKind, thread: ThreadRef, payload: Vec<u8>) -> Self {
        let fingerprint = Fingerprint::of(&payload);
        Self {
            kind,
            thread,
            payload,
            fingerprint,
        }
    }
}

impl std::fmt::Debug for OutgoingSync {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutgoingSync")
            .field("kind", &self.kind)
            .field("thread", &self.thread)
            .field("payload", &format_args!("[{} bytes REDACTED]", self.payload.len()))
            .field("fingerprint", &self.fingerprint)
            .finish()
    }
}

/// Delivers sync payloads to the user's other devices.
///
/// Implementations may suspend for as long as delivery takes. The
/// dispatcher runs them outside the per-kind lane so other requests for the
/// kind keep being answered meanwhile.
#[async_trait]
pub trait MessageTransport: Send + Sync + 'static {
    /// Send one payload. `Ok` means the transport accepted it for delivery.
    async fn send(&self, outgoing: OutgoingSync) -> Result<(), TransportError>;
}
