//! Per-kind dispatch state machine for linksync.
//!
//! This module provides a pure, side-effect-free state machine for one sync
//! kind's dispatch lane. The state machine takes events as input and produces
//! a list of actions to execute.
//!
//! The actual I/O (building payloads, transmitting, persisting fingerprints)
//! is performed by sync-dispatch, not by this module. Every event for a kind
//! must be applied in order on that kind's lane; that ordering is what makes
//! the check-and-set of the in-flight guard race-free.
//!
//! ```text
//! Requested ──► Building ──► Sending ──► Persisting ──► Sent
//!     │            │  │         │
//!     ▼            │  ▼         ▼
//! SkippedDebounced │ SkippedRedundant / SkippedDebounced
//!                  ▼         Transmission error
//!             Build error
//! ```

use std::collections::HashMap;
use sync_types::{DispatchError, Fingerprint, SyncKind, SyncOutcome};

use crate::policy::{SyncPolicy, Ticket};

/// Where an accepted request currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Destination, payload and prior fingerprint are being read.
    Building,
    /// Handed to the transport, waiting for its result.
    Sending {
        /// Fingerprint of the payload being sent.
        fingerprint: Fingerprint,
    },
    /// Transmission succeeded, fingerprint is being written.
    Persisting {
        /// Fingerprint being persisted.
        fingerprint: Fingerprint,
    },
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    policy: SyncPolicy,
    phase: Phase,
}

/// Dispatch state for one sync kind - NO I/O, just state transitions.
#[derive(Debug)]
pub struct LaneState {
    kind: SyncKind,
    /// Ticket holding the in-flight guard, if any.
    in_flight: Option<Ticket>,
    pending: HashMap<Ticket, Pending>,
}

impl LaneState {
    /// Create an idle lane for the given kind.
    pub fn new(kind: SyncKind) -> Self {
        Self {
            kind,
            in_flight: None,
            pending: HashMap::new(),
        }
    }

    /// Process an event and return the actions to execute.
    ///
    /// This is a pure function of the current state and the event. Events
    /// for unknown tickets, or for a ticket in the wrong phase, are ignored.
    pub fn on_event(&mut self, event: Event) -> Vec<Action> {
        match event {
            Event::Requested { ticket, policy } => {
                if self.pending.contains_key(&ticket) {
                    return vec![];
                }
                if policy.debounce && self.in_flight.is_some() {
                    return vec![Action::Complete {
                        ticket,
                        result: Ok(SyncOutcome::SkippedDebounced),
                    }];
                }
                self.pending.insert(
                    ticket,
                    Pending {
                        policy,
                        phase: Phase::Building,
                    },
                );
                vec![Action::Build { ticket }]
            }

            Event::Built {
                ticket,
                candidate,
                prior,
            } => {
                let Some(pending) = self.pending_in(ticket, |p| matches!(p, Phase::Building))
                else {
                    return vec![];
                };
                let policy = pending.policy;

                if policy.skip_if_redundant && prior == Some(candidate) {
                    self.pending.remove(&ticket);
                    return vec![Action::Complete {
                        ticket,
                        result: Ok(SyncOutcome::SkippedRedundant),
                    }];
                }

                if policy.debounce {
                    if self.in_flight.is_some() {
                        // Another debounced send took the guard while this
                        // one was building.
                        self.pending.remove(&ticket);
                        return vec![Action::Complete {
                            ticket,
                            result: Ok(SyncOutcome::SkippedDebounced),
                        }];
                    }
                    self.in_flight = Some(ticket);
                }

                self.set_phase(
                    ticket,
                    Phase::Sending {
                        fingerprint: candidate,
                    },
                );
                vec![Action::Transmit {
                    ticket,
                    fingerprint: candidate,
                }]
            }

            Event::BuildFailed { ticket, error } => {
                if self
                    .pending_in(ticket, |p| matches!(p, Phase::Building))
                    .is_none()
                {
                    return vec![];
                }
                self.pending.remove(&ticket);
                vec![Action::Complete {
                    ticket,
                    result: Err(error),
                }]
            }

            Event::SendSucceeded { ticket } => {
                let Some(Phase::Sending { fingerprint }) = self.phase(ticket) else {
                    return vec![];
                };
                self.set_phase(ticket, Phase::Persisting { fingerprint });
                vec![Action::PersistFingerprint {
                    ticket,
                    fingerprint,
                }]
            }

            Event::SendFailed { ticket, error } => {
                let Some(Phase::Sending { .. }) = self.phase(ticket) else {
                    return vec![];
                };
                self.finish(ticket);
                vec![Action::Complete {
                    ticket,
                    result: Err(DispatchError::Transmission(error)),
                }]
            }

            Event::Persisted { ticket } => {
                let Some(Phase::Persisting { fingerprint }) = self.phase(ticket) else {
                    return vec![];
                };
                self.finish(ticket);
                vec![Action::Complete {
                    ticket,
                    result: Ok(SyncOutcome::Sent { fingerprint }),
                }]
            }
        }
    }

    /// The kind this lane serves.
    pub fn kind(&self) -> SyncKind {
        self.kind
    }

    /// Ticket currently holding the in-flight guard.
    pub fn in_flight(&self) -> Option<Ticket> {
        self.in_flight
    }

    /// Check if a debounced transmission is outstanding.
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Current phase of an accepted request.
    pub fn phase(&self, ticket: Ticket) -> Option<Phase> {
        self.pending.get(&ticket).map(|p| p.phase)
    }

    /// Number of accepted requests not yet completed.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    fn pending_in(&self, ticket: Ticket, accept: impl Fn(&Phase) -> bool) -> Option<Pending> {
        self.pending
            .get(&ticket)
            .filter(|p| accept(&p.phase))
            .copied()
    }

    fn set_phase(&mut self, ticket: Ticket, phase: Phase) {
        if let Some(pending) = self.pending.get_mut(&ticket) {
            pending.phase = phase;
        }
    }

    /// Drop a request and release the guard if it was the holder.
    fn finish(&mut self, ticket: Ticket) {
        self.pending.remove(&ticket);
        if self.in_flight == Some(ticket) {
            self.in_flight = None;
        }
    }
}

/// Events that drive a lane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A sync request was dispatched.
    Requested {
        /// Ticket assigned to the request.
        ticket: Ticket,
        /// Debounce and redundancy policy.
        policy: SyncPolicy,
    },
    /// The payload was serialized.
    Built {
        /// The request being built.
        ticket: Ticket,
        /// Fingerprint of the freshly built payload.
        candidate: Fingerprint,
        /// Last successfully sent fingerprint, read in the same transaction.
        prior: Option<Fingerprint>,
    },
    /// Destination resolution or payload serialization failed.
    BuildFailed {
        /// The request being built.
        ticket: Ticket,
        /// Why the build failed.
        error: DispatchError,
    },
    /// The transport reported success.
    SendSucceeded {
        /// The request that was sent.
        ticket: Ticket,
    },
    /// The transport reported failure.
    SendFailed {
        /// The request that was sent.
        ticket: Ticket,
        /// Error message from the transport.
        error: String,
    },
    /// The fingerprint write finished (successfully or not).
    Persisted {
        /// The request whose fingerprint was written.
        ticket: Ticket,
    },
}

/// Actions to be executed by the lane shell.
///
/// These are instructions, not side effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Resolve the destination, build the payload and read the prior
    /// fingerprint, then report `Built` or `BuildFailed`.
    Build {
        /// The request to build.
        ticket: Ticket,
    },
    /// Hand the built payload to the transport off-lane.
    Transmit {
        /// The request to send.
        ticket: Ticket,
        /// Fingerprint of the payload.
        fingerprint: Fingerprint,
    },
    /// Write the fingerprint in a fresh write transaction, then report
    /// `Persisted`.
    PersistFingerprint {
        /// The request that was sent.
        ticket: Ticket,
        /// Fingerprint to persist.
        fingerprint: Fingerprint,
    },
    /// Resolve the request's completion handle.
    Complete {
        /// The request to resolve.
        ticket: Ticket,
        /// Final result.
        result: Result<SyncOutcome, DispatchError>,
    },
}
