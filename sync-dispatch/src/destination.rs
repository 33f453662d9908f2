//! Resolution of the thread sync payloads are posted to.

use async_trait::async_trait;
use sync_store::{LocalThreads, StorageError, WriteTransaction};
use sync_types::{SyncKind, ThreadRef};

/// Provides the local sync thread for a kind.
///
/// `Ok(None)` means the destination does not exist and cannot be created.
/// The coordinator treats that as a setup defect.
#[async_trait]
pub trait LocalDestination: Send + Sync {
    /// Get or create the thread that syncs of `kind` are addressed to.
    async fn local_thread(
        &self,
        kind: SyncKind,
        txn: &mut WriteTransaction,
    ) -> Result<Option<ThreadRef>, StorageError>;
}

/// Every kind goes to the single local thread kept in the store.
#[derive(Debug, Default, Clone, Copy)]
pub struct StoredLocalThread;

#[async_trait]
impl LocalDestination for StoredLocalThread {
    async fn local_thread(
        &self,
        _kind: SyncKind,
        txn: &mut WriteTransaction,
    ) -> Result<Option<ThreadRef>, StorageError> {
        LocalThreads::get_or_create(txn).await.map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sync_store::SqliteStore;

    #[tokio::test]
    async fn all_kinds_share_one_thread() {
        let store = SqliteStore::in_memory().await.unwrap();
        let mut txn = store.begin_write().await.unwrap();

        let contacts = StoredLocalThread
            .local_thread(SyncKind::Contacts, &mut txn)
            .await
            .unwrap();
        let groups = StoredLocalThread
            .local_thread(SyncKind::Groups, &mut txn)
            .await
            .unwrap();

        assert!(contacts.is_some());
        assert_eq!(contacts, groups);
    }
}
