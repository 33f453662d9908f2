//! Resolution of an accepted sync request.

use crate::Fingerprint;

/// How an accepted sync request was resolved, when it did not fail.
///
/// Skips are deliberate no-ops, not errors. They are kept apart so callers
/// and logs can tell a burst being absorbed from an unchanged payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The payload was transmitted.
    Sent {
        /// Fingerprint of the transmitted payload.
        fingerprint: Fingerprint,
    },
    /// A debounced sync of the same kind was already in flight.
    SkippedDebounced,
    /// The payload was identical to the last successfully sent one.
    SkippedRedundant,
}

impl SyncOutcome {
    /// Whether the request was dropped without transmitting.
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::SkippedDebounced | Self::SkippedRedundant)
    }

    /// Fingerprint of the transmitted payload, if one was sent.
    pub fn fingerprint(&self) -> Option<Fingerprint> {
        match self {
            Self::Sent { fingerprint } => Some(*fingerprint),
            _ => None,
        }
    }
}
