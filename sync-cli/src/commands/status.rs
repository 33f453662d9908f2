//! Show sync status.

use anyhow::Result;
use sync_dispatch::SyncKind;
use sync_store::{LastSentFingerprints, LocalThreads, StoredFingerprint};

use crate::workspace::Workspace;

/// Run the status command.
pub async fn run(workspace: &Workspace, json: bool) -> Result<()> {
    let store = workspace.open_store().await?;

    let mut txn = store.begin_read().await?;
    let thread = LocalThreads::get(&mut txn).await?;
    let fingerprints = LastSentFingerprints::list(&mut txn).await?;
    txn.finish().await?;
    store.close().await;

    let spooled = workspace.outbox().entries().await?.len();

    if json {
        let value = serde_json::json!({
            "data_dir": workspace.data_dir.display().to_string(),
            "local_thread": thread.map(|t| t.to_string()),
            "outbox": spooled,
            "last_sent": fingerprints
                .iter()
                .map(|f| serde_json::json!({
                    "kind": f.kind,
                    "fingerprint": f.fingerprint.to_string(),
                    "sent_at": f.sent_at,
                }))
                .collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("=== linksync status ===");
    println!();
    println!("Data dir:     {}", workspace.data_dir.display());
    match thread {
        Some(thread) => println!("Local thread: {}", thread),
        None => println!("Local thread: NOT CREATED (created on first sync)"),
    }
    println!("Outbox:       {} spooled", spooled);
    println!();
    println!("Last sent:");
    for kind in SyncKind::ALL {
        println!("  {:<14} {}", kind.as_str(), describe(kind, &fingerprints));
    }

    Ok(())
}

fn describe(kind: SyncKind, fingerprints: &[StoredFingerprint]) -> String {
    match fingerprints.iter().find(|f| f.kind == kind) {
        Some(f) => format!("{} ({})", f.fingerprint, format_timestamp(f.sent_at)),
        None => "never".to_string(),
    }
}

/// Format a Unix timestamp as a human-readable string.
fn format_timestamp(ts: i64) -> String {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0);

    let diff = now.saturating_sub(ts).max(0);

    if diff < 60 {
        "just now".to_string()
    } else if diff < 3600 {
        format!("{} minutes ago", diff / 60)
    } else if diff < 86400 {
        format!("{} hours ago", diff / 3600)
    } else {
        format!("{} days ago", diff / 86400)
    }
}
