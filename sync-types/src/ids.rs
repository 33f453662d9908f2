//! Identity types for linksync.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The category of payload being synchronized to the user's other devices.
///
/// Each kind has its own dispatch lane, its own in-flight guard, and its own
/// persisted last-sent fingerprint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncKind {
    /// The contact list.
    Contacts,
    /// Account-level configuration (settings, profile key, read receipts).
    Configuration,
    /// Group membership.
    Groups,
}

impl SyncKind {
    /// Every sync kind, in a stable order.
    pub const ALL: [SyncKind; 3] = [Self::Contacts, Self::Configuration, Self::Groups];

    /// Stable lowercase name, used as the storage key.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Contacts => "contacts",
            Self::Configuration => "configuration",
            Self::Groups => "groups",
        }
    }
}

impl fmt::Display for SyncKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown sync kind name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown sync kind: {0}")]
pub struct ParseKindError(pub String);

impl FromStr for SyncKind {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "contacts" => Ok(Self::Contacts),
            "configuration" => Ok(Self::Configuration),
            "groups" => Ok(Self::Groups),
            other => Err(ParseKindError(other.to_string())),
        }
    }
}

/// Reference to the local sync thread that outgoing syncs are addressed to.
///
/// The thread is a conversation with the user's own account; messages posted
/// there reach every other linked device. UUID v4 format (16 bytes).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThreadRef(uuid::Uuid);

impl ThreadRef {
    /// Create a new random ThreadRef.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Create a ThreadRef from raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        uuid::Uuid::from_slice(bytes).ok().map(Self)
    }

    /// Get the raw bytes of this ThreadRef.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl Default for ThreadRef {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ThreadRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for ThreadRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ThreadRef({})", self.0)
    }
}
