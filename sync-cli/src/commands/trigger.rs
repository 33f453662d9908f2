//! Fire one trigger.

use anyhow::{Context, Result};
use sync_dispatch::{MessageTransport, PayloadSource, SyncCoordinator, SyncOutcome, Trigger};

use crate::workspace::Workspace;

/// Run the trigger command.
pub async fn run(workspace: &Workspace, trigger: Trigger, payload: Option<Vec<u8>>) -> Result<()> {
    let coordinator = workspace.open_coordinator().await?;
    let result = fire(&coordinator, &trigger, payload).await;
    coordinator.store().close().await;

    println!("{}", result?);
    Ok(())
}

/// Dispatch `trigger` and describe its outcome.
pub async fn fire<T: MessageTransport>(
    coordinator: &SyncCoordinator<T>,
    trigger: &Trigger,
    payload: Option<Vec<u8>>,
) -> Result<String> {
    let mut request = trigger.request();
    if let Some(bytes) = payload {
        request = request.with_source(PayloadSource::Inline(bytes));
    }
    let kind = request.kind;

    let outcome = coordinator
        .dispatch(request)
        .await
        .with_context(|| format!("{} sync for {} failed", kind, trigger))?;

    Ok(describe(&outcome))
}

/// One-line, user-facing description of an outcome.
pub fn describe(outcome: &SyncOutcome) -> String {
    match outcome {
        SyncOutcome::Sent { fingerprint } => format!("sent {}", fingerprint),
        SyncOutcome::SkippedDebounced => "skipped: already in flight".to_string(),
        SyncOutcome::SkippedRedundant => "skipped: unchanged since last sync".to_string(),
    }
}
