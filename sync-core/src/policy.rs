//! Request policy and identity.

use std::fmt;

/// How a sync request interacts with the in-flight guard and the last-sent
/// fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SyncPolicy {
    /// Drop the request while a debounced sync of the same kind is in
    /// flight, and hold the guard while this one transmits.
    pub debounce: bool,
    /// Drop the request when its payload matches the last successful send.
    pub skip_if_redundant: bool,
}

impl SyncPolicy {
    /// Background keep-alive sync: debounced and deduplicated.
    pub const fn routine() -> Self {
        Self {
            debounce: true,
            skip_if_redundant: true,
        }
    }

    /// Caller-requested sync: always transmits, never touches the guard.
    pub const fn explicit() -> Self {
        Self {
            debounce: false,
            skip_if_redundant: false,
        }
    }
}

/// Identity of one accepted sync request.
///
/// Assigned by the coordinator in dispatch order.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

impl Ticket {
    /// Create a ticket with the given value.
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Get the numeric value of this ticket.
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Debug for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ticket({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routine_policy_debounces_and_dedups() {
        let policy = SyncPolicy::routine();
        assert!(policy.debounce);
        assert!(policy.skip_if_redundant);
    }

    #[test]
    fn explicit_policy_does_neither() {
        let policy = SyncPolicy::explicit();
        assert!(!policy.debounce);
        assert!(!policy.skip_if_redundant);
    }

    #[test]
    fn tickets_order_by_value() {
        assert!(Ticket::new(1) < Ticket::new(2));
        assert_eq!(Ticket::new(7).to_string(), "#7");
    }
}
