//! Trigger events and the channel that delivers them.
//!
//! Trigger sources either call [`SyncCoordinator::dispatch`] directly with
//! [`Trigger::request`], or publish onto a [`TriggerSender`] and let a
//! listener task dispatch fire-and-forget.

use std::str::FromStr;
use std::sync::Arc;

use sync_types::SyncKind;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::coordinator::SyncCoordinator;
use crate::request::{PayloadSource, SyncRequest};
use crate::transport::MessageTransport;

/// Something happened that may warrant a sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// The set of known accounts changed.
    AccountsChanged,
    /// The local profile key changed.
    ProfileKeyChanged,
    /// User asked to sync all contacts.
    SyncAllContacts,
    /// User asked to sync one local record.
    SyncLocalRecord(String),
    /// The app finished starting.
    AppReady,
    /// A synced setting changed.
    SettingsChanged,
    /// User asked to sync groups.
    SyncGroups,
}

impl Trigger {
    /// The sync request this trigger maps to.
    pub fn request(&self) -> SyncRequest {
        match self {
            Self::AccountsChanged | Self::ProfileKeyChanged => {
                SyncRequest::routine(SyncKind::Contacts)
            }
            Self::SyncAllContacts => SyncRequest::explicit(SyncKind::Contacts),
            Self::SyncLocalRecord(id) => SyncRequest::explicit(SyncKind::Contacts)
                .with_source(PayloadSource::Record(id.clone())),
            Self::AppReady | Self::SettingsChanged => {
                SyncRequest::explicit(SyncKind::Configuration)
            }
            Self::SyncGroups => SyncRequest::explicit(SyncKind::Groups),
        }
    }

    /// Stable kebab-case name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::AccountsChanged => "accounts-changed",
            Self::ProfileKeyChanged => "profile-key-changed",
            Self::SyncAllContacts => "sync-all-contacts",
            Self::SyncLocalRecord(_) => "sync-local-record",
            Self::AppReady => "app-ready",
            Self::SettingsChanged => "settings-changed",
            Self::SyncGroups => "sync-groups",
        }
    }
}

impl std::fmt::Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SyncLocalRecord(id) => write!(f, "{} {}", self.name(), id),
            _ => f.write_str(self.name()),
        }
    }
}

/// Error parsing a trigger name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown trigger: {0}")]
pub struct ParseTriggerError(String);

impl FromStr for Trigger {
    type Err = ParseTriggerError;

    /// Parses the [`Display`](std::fmt::Display) form, e.g. `app-ready` or
    /// `sync-local-record alice`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (name, arg) = match s.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, Some(arg.trim())),
            None => (s, None),
        };

        match (name, arg) {
            ("accounts-changed", None) => Ok(Self::AccountsChanged),
            ("profile-key-changed", None) => Ok(Self::ProfileKeyChanged),
            ("sync-all-contacts", None) => Ok(Self::SyncAllContacts),
            ("sync-local-record", Some(id)) if !id.is_empty() => {
                Ok(Self::SyncLocalRecord(id.to_string()))
            }
            ("app-ready", None) => Ok(Self::AppReady),
            ("settings-changed", None) => Ok(Self::SettingsChanged),
            ("sync-groups", None) => Ok(Self::SyncGroups),
            _ => Err(ParseTriggerError(s.to_string())),
        }
    }
}

/// Publishing side of the trigger channel.
#[derive(Debug, Clone)]
pub struct TriggerSender {
    tx: mpsc::Sender<Trigger>,
}

impl TriggerSender {
    /// Publish a trigger, waiting if the buffer is full.
    ///
    /// Returns the trigger back if the listener has stopped.
    pub async fn send(&self, trigger: Trigger) -> Result<(), Trigger> {
        self.tx.send(trigger).await.map_err(|e| e.0)
    }

    /// Publish a trigger without waiting.
    ///
    /// Returns the trigger back if the buffer is full or the listener has
    /// stopped.
    pub fn try_send(&self, trigger: Trigger) -> Result<(), Trigger> {
        self.tx.try_send(trigger).map_err(|e| match e {
            mpsc::error::TrySendError::Full(t) | mpsc::error::TrySendError::Closed(t) => t,
        })
    }
}

/// Create a bounded trigger channel.
pub fn trigger_channel(capacity: usize) -> (TriggerSender, mpsc::Receiver<Trigger>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (TriggerSender { tx }, rx)
}

/// Dispatch every received trigger until all senders are dropped.
///
/// Outcomes are logged, never returned: triggers are fire-and-forget.
pub fn spawn_trigger_listener<T: MessageTransport>(
    coordinator: Arc<SyncCoordinator<T>>,
    mut rx: mpsc::Receiver<Trigger>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tracing::debug!("Trigger listener started");

        while let Some(trigger) = rx.recv().await {
            let handle = coordinator.dispatch(trigger.request());
            tokio::spawn(async move {
                match handle.await {
                    Ok(outcome) => tracing::debug!("Trigger {} resolved: {:?}", trigger, outcome),
                    Err(e) => tracing::warn!("Trigger {} failed: {}", trigger, e),
                }
            });
        }

        tracing::debug!("Trigger listener stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sync_core::SyncPolicy;

    #[test]
    fn routine_triggers_are_debounced_contacts() {
        for trigger in [Trigger::AccountsChanged, Trigger::ProfileKeyChanged] {
            let request = trigger.request();
            assert_eq!(request.kind, SyncKind::Contacts);
            assert_eq!(request.policy, SyncPolicy::routine());
            assert_eq!(request.source, PayloadSource::Current);
        }
    }

    #[test]
    fn explicit_triggers_always_send() {
        let cases = [
            (Trigger::SyncAllContacts, SyncKind::Contacts),
            (Trigger::AppReady, SyncKind::Configuration),
            (Trigger::SettingsChanged, SyncKind::Configuration),
            (Trigger::SyncGroups, SyncKind::Groups),
        ];
        for (trigger, kind) in cases {
            let request = trigger.request();
            assert_eq!(request.kind, kind, "{}", trigger);
            assert_eq!(request.policy, SyncPolicy::explicit(), "{}", trigger);
        }
    }

    #[test]
    fn local_record_trigger_carries_record_id() {
        let request = Trigger::SyncLocalRecord("alice".into()).request();
        assert_eq!(request.kind, SyncKind::Contacts);
        assert_eq!(request.policy, SyncPolicy::explicit());
        assert_eq!(request.source, PayloadSource::Record("alice".into()));
    }

    #[test]
    fn parse_trigger_names() {
        assert_eq!("app-ready".parse::<Trigger>().unwrap(), Trigger::AppReady);
        assert_eq!(
            " accounts-changed \n".parse::<Trigger>().unwrap(),
            Trigger::AccountsChanged
        );
        assert_eq!(
            "sync-local-record  bob".parse::<Trigger>().unwrap(),
            Trigger::SyncLocalRecord("bob".into())
        );
    }

    #[test]
    fn parse_rejects_unknown_or_malformed() {
        assert!("reboot".parse::<Trigger>().is_err());
        assert!("sync-local-record".parse::<Trigger>().is_err());
        assert!("app-ready now".parse::<Trigger>().is_err());
    }

    #[test]
    fn display_round_trips_through_parse() {
        let trigger = Trigger::SyncLocalRecord("carol".into());
        assert_eq!(trigger.to_string().parse::<Trigger>().unwrap(), trigger);
    }

    #[tokio::test]
    async fn try_send_returns_trigger_when_full() {
        let (tx, _rx) = trigger_channel(1);
        tx.try_send(Trigger::AppReady).unwrap();
        assert_eq!(tx.try_send(Trigger::SyncGroups), Err(Trigger::SyncGroups));
    }
}
