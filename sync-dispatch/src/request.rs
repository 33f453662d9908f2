//! Sync requests as issued by trigger sources.

use sync_core::SyncPolicy;
use sync_types::SyncKind;

/// What the payload builder should serialize.
#[derive(Clone, PartialEq, Eq)]
pub enum PayloadSource {
    /// The current application state for the kind.
    Current,
    /// A single local record, by its application-level id.
    Record(String),
    /// A payload the caller already serialized.
    Inline(Vec<u8>),
}

impl std::fmt::Debug for PayloadSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Current => f.write_str("Current"),
            Self::Record(id) => f.debug_tuple("Record").field(id).finish(),
            Self::Inline(bytes) => write!(f, "Inline([{} bytes REDACTED])", bytes.len()),
        }
    }
}

/// One request to sync a kind. Created per trigger; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRequest {
    /// Kind of sync.
    pub kind: SyncKind,
    /// Debounce and redundancy policy.
    pub policy: SyncPolicy,
    /// What to serialize.
    pub source: PayloadSource,
}

impl SyncRequest {
    /// Create a request for the current state of `kind`.
    pub fn new(kind: SyncKind, policy: SyncPolicy) -> Self {
        Self {
            kind,
            policy,
            source: PayloadSource::Current,
        }
    }

    /// Background sync: debounced and skipped when unchanged.
    pub fn routine(kind: SyncKind) -> Self {
        Self::new(kind, SyncPolicy::routine())
    }

    /// Caller-requested sync: always transmits.
    pub fn explicit(kind: SyncKind) -> Self {
        Self::new(kind, SyncPolicy::explicit())
    }

    /// Set the payload source.
    pub fn with_source(mut self, source: PayloadSource) -> Self {
        self.source = source;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routine_request_uses_current_state() {
        let request = SyncRequest::routine(SyncKind::Contacts);
        assert_eq!(request.policy, SyncPolicy::routine());
        assert_eq!(request.source, PayloadSource::Current);
    }

    #[test]
    fn with_source_replaces_source() {
        let request = SyncRequest::explicit(SyncKind::Contacts)
            .with_source(PayloadSource::Record("alice".into()));
        assert_eq!(request.source, PayloadSource::Record("alice".into()));
        assert_eq!(request.policy, SyncPolicy::explicit());
    }

    #[test]
    fn inline_debug_redacts_payload() {
        let source = PayloadSource::Inline(vec![0xDE, 0xAD, 0xBE, 0xEF]);
        let debug = format!("{:?}", source);
        assert!(
            debug.contains("[4 bytes REDACTED]"),
            "payload should be redacted, got: {}",
            debug
        );
        assert!(!debug.contains("222"), "payload bytes must not appear in Debug output");
    }
}
