//! The local sync thread: the conversation with the user's own account that
//! sync payloads are posted to.

use crate::error::StorageError;
use crate::sqlite::{unix_now, Transactional, WriteTransaction};
use sync_types::ThreadRef;

/// Accessors for the single-row `local_thread` table.
pub struct LocalThreads;

impl LocalThreads {
    /// Read the local sync thread, if it has been created.
    pub async fn get<T: Transactional>(txn: &mut T) -> Result<Option<ThreadRef>, StorageError> {
        let bytes: Option<Vec<u8>> =
            sqlx::query_scalar("SELECT thread_id FROM local_thread WHERE slot = 1")
                .fetch_optional(txn.connection())
                .await?;

        bytes
            .map(|b| {
                ThreadRef::from_bytes(&b).ok_or_else(|| StorageError::Corrupt {
                    table: "local_thread",
                    reason: format!("thread id has {} bytes", b.len()),
                })
            })
            .transpose()
    }

    /// Read the local sync thread, creating it on first use.
    ///
    /// The new row is only visible to others once `txn` is committed.
    pub async fn get_or_create(txn: &mut WriteTransaction) -> Result<ThreadRef, StorageError> {
        if let Some(existing) = Self::get(txn).await? {
            return Ok(existing);
        }

        let thread = ThreadRef::new();
        sqlx::query("INSERT INTO local_thread (slot, thread_id, created_at) VALUES (1, ?1, ?2)")
            .bind(thread.as_bytes())
            .bind(unix_now())
            .execute(txn.connection())
            .await?;

        tracing::info!("Created local sync thread {}", thread);
        Ok(thread)
    }
}
