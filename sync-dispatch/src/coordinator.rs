//! The sync coordinator.
//!
//! Entry point for all outbound syncs. Assigns tickets, routes each request
//! to the lane for its kind (spawning it on first use) and hands the caller a
//! [`CompletionHandle`].

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use dashmap::DashMap;
use sync_core::Ticket;
use sync_store::{SqliteStore, StorageError};
use sync_types::{DispatchError, SyncKind, SyncOutcome};
use tokio::sync::{mpsc, oneshot};

use crate::builder::PayloadBuilder;
use crate::config::Config;
use crate::destination::{LocalDestination, StoredLocalThread};
use crate::lane::{self, LaneMessage};
use crate::metrics::{DispatchMetrics, MetricsSnapshot};
use crate::request::SyncRequest;
use crate::transport::MessageTransport;

/// Final result of a dispatched request.
pub type DispatchResult = Result<SyncOutcome, DispatchError>;

/// Collaborators shared by every lane.
pub(crate) struct Shared<T: MessageTransport> {
    pub(crate) store: SqliteStore,
    pub(crate) builder: Arc<dyn PayloadBuilder>,
    pub(crate) destination: Arc<dyn LocalDestination>,
    pub(crate) transport: Arc<T>,
    pub(crate) metrics: DispatchMetrics,
}

/// Debounced, deduplicated, single-flight sync dispatcher.
///
/// Each sync kind gets its own lane: requests of one kind are decided in
/// order, while different kinds never wait on each other (beyond sharing
/// the store).
///
/// Must be used from within a tokio runtime.
pub struct SyncCoordinator<T: MessageTransport> {
    shared: Arc<Shared<T>>,
    lanes: DashMap<SyncKind, mpsc::UnboundedSender<LaneMessage>>,
    next_ticket: AtomicU64,
}

impl<T: MessageTransport> SyncCoordinator<T> {
    /// Create a coordinator from its collaborators.
    pub fn new(
        store: SqliteStore,
        builder: Arc<dyn PayloadBuilder>,
        destination: Arc<dyn LocalDestination>,
        transport: T,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                store,
                builder,
                destination,
                transport: Arc::new(transport),
                metrics: DispatchMetrics::default(),
            }),
            lanes: DashMap::new(),
            next_ticket: AtomicU64::new(0),
        }
    }

    /// Open the configured store and create a coordinator that addresses
    /// every kind to the stored local thread.
    pub async fn open(
        config: &Config,
        builder: Arc<dyn PayloadBuilder>,
        transport: T,
    ) -> Result<Self, StorageError> {
        let store = SqliteStore::from_config(&config.storage).await?;
        Ok(Self::new(
            store,
            builder,
            Arc::new(StoredLocalThread),
            transport,
        ))
    }

    /// Dispatch a sync request.
    ///
    /// Returns immediately. The handle resolves once the request is sent,
    /// skipped or failed; dropping it (or calling
    /// [`detach`](CompletionHandle::detach)) does not cancel the request.
    pub fn dispatch(&self, request: SyncRequest) -> CompletionHandle {
        let ticket = Ticket::new(self.next_ticket.fetch_add(1, Ordering::Relaxed) + 1);
        let kind = request.kind;
        let (reply, rx) = oneshot::channel();

        self.shared.metrics.record_dispatched();
        tracing::debug!(
            "Dispatching {} sync {} (debounce={}, skip_if_redundant={})",
            kind,
            ticket,
            request.policy.debounce,
            request.policy.skip_if_redundant
        );

        let message = LaneMessage::Dispatch {
            ticket,
            request,
            reply,
        };
        if let Err(mpsc::error::SendError(message)) = self.lane(kind).send(message) {
            // Lane task died. Replace it unless a concurrent dispatch already
            // has; if the send fails again the handle resolves `Shutdown`.
            tracing::warn!("{} lane was gone, restarting", kind);
            self.lanes.remove_if(&kind, |_, tx| tx.is_closed());
            let _ = self.lane(kind).send(message);
        }

        CompletionHandle { ticket, kind, rx }
    }

    /// Mailbox of the lane for `kind`, spawning it on first use.
    fn lane(&self, kind: SyncKind) -> mpsc::UnboundedSender<LaneMessage> {
        self.lanes
            .entry(kind)
            .or_insert_with(|| lane::spawn(kind, Arc::clone(&self.shared)))
            .value()
            .clone()
    }

    /// Current dispatch counters.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.shared.metrics.snapshot()
    }

    /// The store used for fingerprints and the local thread.
    pub fn store(&self) -> &SqliteStore {
        &self.shared.store
    }

    /// The transport (e.g. to inspect a mock in tests).
    pub fn transport(&self) -> &T {
        &self.shared.transport
    }
}

/// Resolves with the outcome of one dispatched request.
///
/// Resolves to [`DispatchError::Shutdown`] if the lane went away before
/// deciding.
#[derive(Debug)]
#[must_use = "await the handle or call detach() to fire and forget"]
pub struct CompletionHandle {
    ticket: Ticket,
    kind: SyncKind,
    rx: oneshot::Receiver<DispatchResult>,
}

impl CompletionHandle {
    /// Ticket assigned to the request.
    pub fn ticket(&self) -> Ticket {
        self.ticket
    }

    /// Kind of the request.
    pub fn kind(&self) -> SyncKind {
        self.kind
    }

    /// Stop waiting for the outcome. The request still runs.
    pub fn detach(self) {}
}

impl Future for CompletionHandle {
    type Output = DispatchResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(DispatchError::Shutdown)))
    }
}
