//! # sync-store
//!
//! Transactional SQLite storage for linksync.
//!
//! The store keeps two things:
//! - the fingerprint of the last successfully sent payload, per sync kind
//! - the identity of the local sync thread that payloads are addressed to
//!
//! ## Transactions
//!
//! Nothing in this crate opens a transaction on the caller's behalf. The
//! dispatcher reads the prior fingerprint inside the same [`ReadTransaction`]
//! it builds the payload in, and writes the new fingerprint in its own short
//! [`WriteTransaction`] once the transport has confirmed the send.
//!
//! ```text
//! begin_read() ──► build payload + LastSentFingerprints::get ──► finish()
//!                           ...transmission...
//! begin_write() ──► LastSentFingerprints::set ──► commit()
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod fingerprints;
pub mod sqlite;
pub mod threads;

pub use config::StorageConfig;
pub use error::{StorageError, StorageResult};
pub use fingerprints::{LastSentFingerprints, StoredFingerprint};
pub use sqlite::{ReadTransaction, SqliteStore, Transactional, WriteTransaction};
pub use threads::LocalThreads;
