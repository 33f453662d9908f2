//! # sync-core
//!
//! Pure dispatch logic for linksync (no I/O, instant tests).
//!
//! This crate implements the per-kind dispatch state machine without any
//! network or storage I/O, enabling fast unit tests.
//!
//! ## Design Philosophy
//!
//! All modules in this crate are **pure** - they take input and produce output
//! without side effects. This enables:
//! - Instant unit tests (no mocks, no async)
//! - Deterministic behavior (same input → same output)
//! - Easy reasoning about the debounce and redundancy rules
//!
//! The actual I/O (building payloads, storage, transmission) is performed by
//! `sync-dispatch`, which interprets the actions produced by [`LaneState`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod policy;
pub mod state;

pub use policy::{SyncPolicy, Ticket};
pub use state::{Action, Event, LaneState, Phase};
