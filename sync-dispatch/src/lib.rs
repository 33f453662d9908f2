//! # sync-dispatch
//!
//! Outbound sync dispatcher for linksync.
//!
//! Decides whether, when and how often to send a sync payload describing local
//! state (contacts, configuration, groups) to the user's other devices.
//!
//! ## Features
//!
//! - **Single-flight**: at most one debounced transmission per kind at a time
//! - **Deduplication**: payloads identical to the last successful send are skipped
//! - **Burst absorption**: redundant triggers are dropped while a send is in flight
//! - **Pure State Machine**: Uses sync-core for side-effect-free decisions
//!
//! ## Architecture
//!
//! ```text
//! Trigger ─► SyncCoordinator::dispatch ─► lane (one task per kind)
//!                                           │  destination ─► PayloadBuilder ─► Fingerprint
//!                                           │  redundancy / debounce (sync-core)
//!                                           ├─► MessageTransport (spawned off-lane)
//!                                           ◄─┘ result marshalled back
//!                                           │  persist fingerprint, release guard
//!                                           ▼
//!                                     CompletionHandle
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use linksync_dispatch::{SyncCoordinator, SyncRequest, MockTransport, InlinePayloadBuilder, StoredLocalThread};
//!
//! let coordinator = SyncCoordinator::new(store, Arc::new(builder), Arc::new(StoredLocalThread), transport);
//!
//! // Fire-and-forget
//! coordinator.dispatch(SyncRequest::routine(SyncKind::Contacts)).detach();
//!
//! // Awaited
//! let outcome = coordinator.dispatch(SyncRequest::explicit(SyncKind::Groups)).await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod builder;
pub mod config;
pub mod coordinator;
pub mod destination;
mod lane;
pub mod metrics;
pub mod request;
pub mod transport;
pub mod triggers;

pub use builder::{BuildError, InlinePayloadBuilder, PayloadBuilder};
pub use config::{Config, ConfigError, DispatchConfig, OutboxConfig};
pub use coordinator::{CompletionHandle, DispatchResult, SyncCoordinator};
pub use destination::{LocalDestination, StoredLocalThread};
pub use metrics::{DispatchMetrics, MetricsSnapshot};
pub use request::{PayloadSource, SyncRequest};
pub use transport::{MessageTransport, MockTransport, OutboxTransport, OutgoingSync, TransportError};
pub use triggers::{spawn_trigger_listener, trigger_channel, ParseTriggerError, Trigger, TriggerSender};

pub use sync_core::SyncPolicy;
pub use sync_types::{DispatchError, Fingerprint, SyncKind, SyncOutcome, ThreadRef};
