//! Error types for linksync.

use crate::SyncKind;
use thiserror::Error;

/// Errors that resolve a dispatched sync request.
///
/// None of these cross the coordinator's lane boundary as a panic or an
/// early return; each one is delivered through the request's completion
/// handle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// The payload could not be serialized.
    #[error("payload build failed: {0}")]
    Build(String),

    /// The local sync thread could not be resolved. This is a setup defect,
    /// not a transient condition.
    #[error("no local sync destination for {kind}")]
    DestinationMissing {
        /// Kind whose destination was missing.
        kind: SyncKind,
    },

    /// The transport reported a failure.
    #[error("transmission failed: {0}")]
    Transmission(String),

    /// The transactional store failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// The coordinator lane went away before resolving the request.
    #[error("coordinator shut down")]
    Shutdown,
}

impl DispatchError {
    /// Whether this error signals a broken precondition rather than a
    /// transient condition.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::DestinationMissing { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = DispatchError::DestinationMissing {
            kind: SyncKind::Contacts,
        };
        assert_eq!(err.to_string(), "no local sync destination for contacts");
    }

    #[test]
    fn only_missing_destination_is_fatal() {
        assert!(DispatchError::DestinationMissing {
            kind: SyncKind::Groups
        }
        .is_fatal());
        assert!(!DispatchError::Transmission("timeout".into()).is_fatal());
        assert!(!DispatchError::Build("empty".into()).is_fatal());
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<DispatchError>();
    }
}
