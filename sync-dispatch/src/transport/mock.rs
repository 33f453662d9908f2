//! Mock transport for testing.
//!
//! Captures sent payloads for verification, injects failures, and can hold
//! sends open until the test releases them.

use super::{MessageTransport, OutgoingSync, TransportError};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

/// Mock transport for testing.
///
/// Clones share state, so a test can keep one handle while the coordinator
/// owns another.
#[derive(Debug, Default, Clone)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
    gate: Option<Arc<Semaphore>>,
}

#[derive(Debug, Default)]
struct MockTransportInner {
    attempts: usize,
    sent_messages: Vec<OutgoingSync>,
    fail_next_send: Option<String>,
}

impl MockTransport {
    /// Create a mock transport that completes sends immediately.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock transport whose sends block until [`release`](Self::release).
    pub fn gated() -> Self {
        Self {
            inner: Arc::default(),
            gate: Some(Arc::new(Semaphore::new(0))),
        }
    }

    /// Let `n` blocked (or future) sends complete. No-op when not gated.
    pub fn release(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }

    /// Get all payloads that were sent successfully.
    pub fn sent_messages(&self) -> Vec<OutgoingSync> {
        let inner = self.inner.lock().unwrap();
        inner.sent_messages.clone()
    }

    /// Get the last payload that was sent successfully.
    pub fn last_sent(&self) -> Option<OutgoingSync> {
        let inner = self.inner.lock().unwrap();
        inner.sent_messages.last().cloned()
    }

    /// Number of successful sends.
    pub fn sent_count(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.sent_messages.len()
    }

    /// Number of send calls, including failed and still-blocked ones.
    pub fn attempts(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.attempts
    }

    /// Cause the next send() to fail with the given error.
    pub fn fail_next_send(&self, error: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next_send = Some(error.to_string());
    }

    /// Clear recorded sends and pending failures.
    pub fn reset(&self) {
        let mut inner = self.inner.lock().unwrap();
        *inner = MockTransportInner::default();
    }
}

#[async_trait]
impl MessageTransport for MockTransport {
    async fn send(&self, outgoing: OutgoingSync) -> Result<(), TransportError> {
        self.inner.lock().unwrap().attempts += 1;

        if let Some(gate) = &self.gate {
            gate.acquire()
                .await
                .map_err(|_| TransportError::Closed)?
                .forget();
        }

        let mut inner = self.inner.lock().unwrap();

        // Check for forced failure
        if let Some(error) = inner.fail_next_send.take() {
            return Err(TransportError::SendFailed(error));
        }

        inner.sent_messages.push(outgoing);
        Ok(())
    }
}
