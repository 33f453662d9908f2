//! # sync-types
//!
//! Shared vocabulary for the linksync outbound sync dispatcher.
//!
//! This crate provides the foundational types used across all linksync crates:
//! - [`SyncKind`], [`ThreadRef`] - What is being synced and where it goes
//! - [`Fingerprint`] - Content digest of a serialized sync payload
//! - [`SyncOutcome`] - How an accepted sync request was resolved
//! - [`DispatchError`] - Why a sync request failed

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod fingerprint;
mod ids;
mod outcome;

pub use error::DispatchError;
pub use fingerprint::{Fingerprint, FINGERPRINT_LEN};
pub use ids::{ParseKindError, SyncKind, ThreadRef};
pub use outcome::SyncOutcome;
