//! Read triggers from stdin and dispatch them fire-and-forget.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use sync_dispatch::{
    spawn_trigger_listener, trigger_channel, MessageTransport, MetricsSnapshot, SyncCoordinator,
    Trigger,
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::workspace::Workspace;

/// Run the listen command.
pub async fn run(workspace: &Workspace) -> Result<()> {
    let coordinator = Arc::new(workspace.open_coordinator().await?);
    let stdin = BufReader::new(tokio::io::stdin());

    let metrics = pump(
        Arc::clone(&coordinator),
        stdin,
        workspace.config.dispatch.trigger_buffer,
    )
    .await?;
    coordinator.store().close().await;

    println!(
        "{} triggers: {} sent, {} skipped (in flight), {} skipped (unchanged), {} failed",
        metrics.dispatched,
        metrics.sent,
        metrics.skipped_debounced,
        metrics.skipped_redundant,
        metrics.failed
    );
    Ok(())
}

/// Feed every line of `input` to a trigger listener, then wait until all
/// dispatched triggers have resolved.
pub async fn pump<T, R>(
    coordinator: Arc<SyncCoordinator<T>>,
    input: R,
    buffer: usize,
) -> Result<MetricsSnapshot>
where
    T: MessageTransport,
    R: AsyncBufRead + Unpin,
{
    let (tx, rx) = trigger_channel(buffer);
    let listener = spawn_trigger_listener(Arc::clone(&coordinator), rx);

    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() || line.trim_start().starts_with('#') {
            continue;
        }
        match line.parse::<Trigger>() {
            Ok(trigger) => {
                if tx.send(trigger).await.is_err() {
                    anyhow::bail!("trigger listener stopped");
                }
            }
            Err(e) => tracing::warn!("Ignoring line: {}", e),
        }
    }

    drop(tx);
    listener.await?;

    loop {
        let metrics = coordinator.metrics();
        if metrics.resolved() >= metrics.dispatched {
            return Ok(metrics);
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::tempdir;

    #[tokio::test]
    async fn pump_dispatches_each_line() {
        let dir = tempdir().unwrap();
        let workspace = Workspace::load(dir.path(), None).unwrap();
        std::fs::create_dir_all(workspace.state_dir()).unwrap();
        std::fs::write(workspace.state_dir().join("configuration"), b"theme=dark").unwrap();
        std::fs::write(workspace.state_dir().join("groups"), b"book club").unwrap();

        let coordinator = Arc::new(workspace.open_coordinator().await.unwrap());
        let input = Cursor::new("# startup\napp-ready\n\nsync-groups\nnot-a-trigger\n");

        let metrics = pump(Arc::clone(&coordinator), input, 4).await.unwrap();

        assert_eq!(metrics.dispatched, 2);
        assert_eq!(metrics.sent, 2);
        assert_eq!(coordinator.transport().entries().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn pump_counts_failures() {
        let dir = tempdir().unwrap();
        let workspace = Workspace::load(dir.path(), None).unwrap();
        let coordinator = Arc::new(workspace.open_coordinator().await.unwrap());

        // No state files: nothing to build.
        let metrics = pump(coordinator, Cursor::new("sync-all-contacts\n"), 4)
            .await
            .unwrap();

        assert_eq!(metrics.dispatched, 1);
        assert_eq!(metrics.failed, 1);
    }
}
