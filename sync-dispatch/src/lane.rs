//! Per-kind lane task.
//!
//! A lane owns the [`LaneState`] for one sync kind and is the only place it
//! is touched, so every decision for a kind is serialized without locks.
//! Storage and payload building run inline on the lane. Transmission is
//! spawned off-lane and its result is posted back to the lane's mailbox,
//! which keeps the lane free to answer (and debounce) new requests while a
//! send is outstanding.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use sync_core::{Action, Event, LaneState, Ticket};
use sync_store::{LastSentFingerprints, SqliteStore, StorageError};
use sync_types::{DispatchError, Fingerprint, SyncKind, SyncOutcome, ThreadRef};
use tokio::sync::{mpsc, oneshot};

use crate::coordinator::{DispatchResult, Shared};
use crate::request::{PayloadSource, SyncRequest};
use crate::transport::{MessageTransport, OutgoingSync, TransportError};

/// Messages a lane receives.
pub(crate) enum LaneMessage {
    /// A new request from the coordinator.
    Dispatch {
        ticket: Ticket,
        request: SyncRequest,
        reply: oneshot::Sender<DispatchResult>,
    },
    /// A spawned transmission finished.
    Transmitted {
        ticket: Ticket,
        result: Result<(), TransportError>,
    },
}

/// A request the lane has not resolved yet.
struct Waiting {
    source: PayloadSource,
    reply: oneshot::Sender<DispatchResult>,
    staged: Option<Staged>,
}

/// A built payload waiting for transmission.
struct Staged {
    thread: ThreadRef,
    payload: Vec<u8>,
}

/// Output of the build step.
struct Prepared {
    thread: ThreadRef,
    payload: Vec<u8>,
    prior: Option<Fingerprint>,
}

pub(crate) struct Lane<T: MessageTransport> {
    kind: SyncKind,
    state: LaneState,
    shared: Arc<Shared<T>>,
    mailbox: mpsc::WeakUnboundedSender<LaneMessage>,
    waiting: HashMap<Ticket, Waiting>,
}

/// Spawn the lane task for `kind` and return its mailbox.
///
/// The task ends once every strong sender is gone and the mailbox drains.
pub(crate) fn spawn<T: MessageTransport>(
    kind: SyncKind,
    shared: Arc<Shared<T>>,
) -> mpsc::UnboundedSender<LaneMessage> {
    let (tx, rx) = mpsc::unbounded_channel();
    let lane = Lane {
        kind,
        state: LaneState::new(kind),
        shared,
        mailbox: tx.downgrade(),
        waiting: HashMap::new(),
    };
    tokio::spawn(lane.run(rx));
    tx
}

impl<T: MessageTransport> Lane<T> {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<LaneMessage>) {
        tracing::debug!("{} lane started", self.kind);

        while let Some(message) = rx.recv().await {
            match message {
                LaneMessage::Dispatch {
                    ticket,
                    request,
                    reply,
                } => {
                    tracing::trace!("{} lane accepted {}", self.kind, ticket);
                    self.waiting.insert(
                        ticket,
                        Waiting {
                            source: request.source,
                            reply,
                            staged: None,
                        },
                    );
                    self.apply(Event::Requested {
                        ticket,
                        policy: request.policy,
                    })
                    .await;
                }
                LaneMessage::Transmitted { ticket, result } => {
                    let event = self.transmitted(ticket, result);
                    self.apply(event).await;
                }
            }
        }

        tracing::debug!("{} lane stopped", self.kind);
    }

    /// Feed an event to the state machine and execute the resulting actions
    /// until none are left.
    async fn apply(&mut self, event: Event) {
        let mut queue: VecDeque<Action> = self.state.on_event(event).into();

        while let Some(action) = queue.pop_front() {
            if let Some(next) = self.execute(action).await {
                queue.extend(self.state.on_event(next));
            }
        }
    }

    async fn execute(&mut self, action: Action) -> Option<Event> {
        match action {
            Action::Build { ticket } => Some(self.build(ticket).await),
            Action::Transmit {
                ticket,
                fingerprint,
            } => self.transmit(ticket, fingerprint).await,
            Action::PersistFingerprint {
                ticket,
                fingerprint,
            } => {
                if let Err(e) = persist(&self.shared.store, self.kind, &fingerprint).await {
                    // The send already happened; a later routine sync will
                    // resend the same content at worst.
                    tracing::error!(
                        "Failed to record {} fingerprint {}: {}",
                        self.kind,
                        fingerprint,
                        e
                    );
                }
                Some(Event::Persisted { ticket })
            }
            Action::Complete { ticket, result } => {
                self.complete(ticket, result);
                None
            }
        }
    }

    async fn build(&mut self, ticket: Ticket) -> Event {
        let prepared = match self.waiting.get(&ticket) {
            Some(waiting) => prepare(&self.shared, self.kind, &waiting.source).await,
            None => Err(DispatchError::Shutdown),
        };

        match prepared {
            Ok(prepared) => {
                let candidate = Fingerprint::of(&prepared.payload);
                if let Some(waiting) = self.waiting.get_mut(&ticket) {
                    waiting.staged = Some(Staged {
                        thread: prepared.thread,
                        payload: prepared.payload,
                    });
                }
                Event::Built {
                    ticket,
                    candidate,
                    prior: prepared.prior,
                }
            }
            Err(error) => {
                if error.is_fatal() {
                    tracing::error!("{} sync {} cannot be delivered: {}", self.kind, ticket, error);
                } else {
                    tracing::warn!("{} sync {} not built: {}", self.kind, ticket, error);
                }
                Event::BuildFailed { ticket, error }
            }
        }
    }

    /// Start the transport send. Returns an event only when the send had to
    /// run inline.
    async fn transmit(&mut self, ticket: Ticket, fingerprint: Fingerprint) -> Option<Event> {
        let Some(staged) = self.waiting.get_mut(&ticket).and_then(|w| w.staged.take()) else {
            return Some(Event::SendFailed {
                ticket,
                error: "payload was not staged".into(),
            });
        };

        let outgoing = OutgoingSync {
            kind: self.kind,
            thread: staged.thread,
            payload: staged.payload,
            fingerprint,
        };
        tracing::debug!(
            "Sending {} sync {} ({} bytes, {})",
            self.kind,
            ticket,
            outgoing.payload.len(),
            fingerprint
        );

        match self.mailbox.upgrade() {
            Some(mailbox) => {
                let transport = Arc::clone(&self.shared.transport);
                tokio::spawn(async move {
                    let result = transport.send(outgoing).await;
                    // Lane gone means nobody is waiting for the result.
                    let _ = mailbox.send(LaneMessage::Transmitted { ticket, result });
                });
                None
            }
            // The coordinator is gone and only queued messages remain. Finish
            // this request inline so its handle still resolves.
            None => {
                let result = self.shared.transport.send(outgoing).await;
                Some(self.transmitted(ticket, result))
            }
        }
    }

    fn transmitted(&self, ticket: Ticket, result: Result<(), TransportError>) -> Event {
        match result {
            Ok(()) => Event::SendSucceeded { ticket },
            Err(e) => Event::SendFailed {
                ticket,
                error: e.to_string(),
            },
        }
    }

    fn complete(&mut self, ticket: Ticket, result: DispatchResult) {
        match &result {
            Ok(SyncOutcome::Sent { fingerprint }) => {
                tracing::info!("{} sync {} sent ({})", self.kind, ticket, fingerprint);
            }
            Ok(SyncOutcome::SkippedDebounced) => {
                tracing::debug!("{} sync {} skipped: already in flight", self.kind, ticket);
            }
            Ok(SyncOutcome::SkippedRedundant) => {
                tracing::debug!("{} sync {} skipped: unchanged", self.kind, ticket);
            }
            Err(DispatchError::Transmission(e)) => {
                tracing::warn!("{} sync {} failed to send: {}", self.kind, ticket, e);
            }
            // Build failures were logged where they happened.
            Err(_) => {}
        }

        self.shared.metrics.record(&result);

        if let Some(waiting) = self.waiting.remove(&ticket) {
            // Receiver dropped means the caller did not want the outcome.
            let _ = waiting.reply.send(result);
        }
    }
}

/// Resolve the destination in its own write transaction, then build the
/// payload and read the prior fingerprint in one read transaction.
async fn prepare<T: MessageTransport>(
    shared: &Shared<T>,
    kind: SyncKind,
    source: &PayloadSource,
) -> Result<Prepared, DispatchError> {
    let mut txn = shared.store.begin_write().await.map_err(storage)?;
    let thread = shared
        .destination
        .local_thread(kind, &mut txn)
        .await
        .map_err(storage)?;
    txn.commit().await.map_err(storage)?;

    let thread = thread.ok_or(DispatchError::DestinationMissing { kind })?;

    let mut txn = shared.store.begin_read().await.map_err(storage)?;
    let payload = shared
        .builder
        .build(kind, source, &mut txn)
        .await
        .map_err(|e| DispatchError::Build(e.to_string()))?;
    let prior = LastSentFingerprints::get(&mut txn, kind)
        .await
        .map_err(storage)?;
    txn.finish().await.map_err(storage)?;

    let payload = payload
        .filter(|p| !p.is_empty())
        .ok_or_else(|| DispatchError::Build(format!("no {} payload to send", kind)))?;

    Ok(Prepared {
        thread,
        payload,
        prior,
    })
}

async fn persist(
    store: &SqliteStore,
    kind: SyncKind,
    fingerprint: &Fingerprint,
) -> Result<(), StorageError> {
    let mut txn = store.begin_write().await?;
    LastSentFingerprints::set(&mut txn, kind, fingerprint).await?;
    txn.commit().await
}

fn storage(e: StorageError) -> DispatchError {
    DispatchError::Storage(e.to_string())
}
