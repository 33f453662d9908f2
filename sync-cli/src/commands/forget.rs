//! Clear the last sent fingerprint of a kind.

use anyhow::Result;
use sync_dispatch::SyncKind;
use sync_store::LastSentFingerprints;

use crate::workspace::Workspace;

/// Run the forget command.
pub async fn run(workspace: &Workspace, kind: SyncKind) -> Result<()> {
    let store = workspace.open_store().await?;

    let mut txn = store.begin_write().await?;
    let cleared = LastSentFingerprints::clear(&mut txn, kind).await?;
    txn.commit().await?;
    store.close().await;

    if cleared {
        println!("forgot last {} sync", kind);
    } else {
        println!("no {} sync recorded", kind);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sync_dispatch::Fingerprint;
    use tempfile::tempdir;

    #[tokio::test]
    async fn forget_clears_fingerprint() {
        let dir = tempdir().unwrap();
        let workspace = Workspace::load(dir.path(), None).unwrap();

        let store = workspace.open_store().await.unwrap();
        let mut txn = store.begin_write().await.unwrap();
        LastSentFingerprints::set(&mut txn, SyncKind::Groups, &Fingerprint::of(b"g"))
            .await
            .unwrap();
        txn.commit().await.unwrap();
        store.close().await;

        run(&workspace, SyncKind::Groups).await.unwrap();

        let store = workspace.open_store().await.unwrap();
        let mut txn = store.begin_read().await.unwrap();
        assert_eq!(
            LastSentFingerprints::get(&mut txn, SyncKind::Groups).await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn forget_without_fingerprint_succeeds() {
        let dir = tempdir().unwrap();
        let workspace = Workspace::load(dir.path(), None).unwrap();
        assert!(run(&workspace, SyncKind::Contacts).await.is_ok());
    }
}
