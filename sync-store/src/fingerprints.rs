//! Last successfully sent fingerprint, per sync kind.
//!
//! A row is written only after the transport confirmed a send, and it is
//! overwritten on every later success. No row means no sync of that kind has
//! ever succeeded, which is a normal state.

use crate::error::StorageError;
use crate::sqlite::{unix_now, Transactional, WriteTransaction};
use sync_types::{Fingerprint, SyncKind};

/// A persisted fingerprint with its kind and write time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFingerprint {
    /// Kind of sync.
    pub kind: SyncKind,
    /// Fingerprint of the last successfully sent payload.
    pub fingerprint: Fingerprint,
    /// Unix timestamp of the successful send.
    pub sent_at: i64,
}

/// Accessors for the `last_sent_fingerprints` table.
pub struct LastSentFingerprints;

impl LastSentFingerprints {
    /// Read the fingerprint of the last successful send of `kind`.
    pub async fn get<T: Transactional>(
        txn: &mut T,
        kind: SyncKind,
    ) -> Result<Option<Fingerprint>, StorageError> {
        let bytes: Option<Vec<u8>> = sqlx::query_scalar(
            "SELECT fingerprint FROM last_sent_fingerprints WHERE kind = ?1",
        )
        .bind(kind.as_str())
        .fetch_optional(txn.connection())
        .await?;

        bytes.map(|b| decode_fingerprint(&b)).transpose()
    }

    /// Record `fingerprint` as the last successful send of `kind`.
    pub async fn set(
        txn: &mut WriteTransaction,
        kind: SyncKind,
        fingerprint: &Fingerprint,
    ) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            INSERT INTO last_sent_fingerprints (kind, fingerprint, sent_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(kind) DO UPDATE SET
                fingerprint = excluded.fingerprint,
                sent_at = excluded.sent_at
            "#,
        )
        .bind(kind.as_str())
        .bind(fingerprint.as_bytes().as_slice())
        .bind(unix_now())
        .execute(txn.connection())
        .await?;

        Ok(())
    }

    /// Forget the last successful send of `kind`.
    ///
    /// The next redundancy-checked sync of that kind will transmit.
    /// Returns whether a row was removed.
    pub async fn clear(txn: &mut WriteTransaction, kind: SyncKind) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM last_sent_fingerprints WHERE kind = ?1")
            .bind(kind.as_str())
            .execute(txn.connection())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// All persisted fingerprints, ordered by kind name.
    pub async fn list<T: Transactional>(txn: &mut T) -> Result<Vec<StoredFingerprint>, StorageError> {
        let rows = sqlx::query_as::<_, FingerprintRow>(
            "SELECT kind, fingerprint, sent_at FROM last_sent_fingerprints ORDER BY kind ASC",
        )
        .fetch_all(txn.connection())
        .await?;

        rows.into_iter().map(|row| row.try_into()).collect()
    }
}

fn decode_fingerprint(bytes: &[u8]) -> Result<Fingerprint, StorageError> {
    Fingerprint::from_bytes(bytes).ok_or_else(|| StorageError::Corrupt {
        table: "last_sent_fingerprints",
        reason: format!("fingerprint has {} bytes: {}", bytes.len(), hex::encode(bytes)),
    })
}

/// Internal row type for SQLite queries.
#[derive(sqlx::FromRow)]
struct FingerprintRow {
    kind: String,
    fingerprint: Vec<u8>,
    sent_at: i64,
}

impl TryFrom<FingerprintRow> for StoredFingerprint {
    type Error = StorageError;

    fn try_from(row: FingerprintRow) -> Result<Self, Self::Error> {
        Ok(StoredFingerprint {
            kind: row.kind.parse().map_err(|e: sync_types::ParseKindError| {
                StorageError::Corrupt {
                    table: "last_sent_fingerprints",
                    reason: e.to_string(),
                }
            })?,
            fingerprint: decode_fingerprint(&row.fingerprint)?,
            sent_at: row.sent_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SqliteStore;

    async fn persist(store: &SqliteStore, kind: SyncKind, payload: &[u8]) {
        let mut txn = store.begin_write().await.unwrap();
        LastSentFingerprints::set(&mut txn, kind, &Fingerprint::of(payload))
            .await
            .unwrap();
        txn.commit().await.unwrap();
    }

    #[tokio::test]
    async fn absent_before_first_sync() {
        let store = SqliteStore::in_memory().await.unwrap();
        let mut txn = store.begin_read().await.unwrap();

        let prior = LastSentFingerprints::get(&mut txn, SyncKind::Contacts)
            .await
            .unwrap();
        assert_eq!(prior, None);
    }

    #[tokio::test]
    async fn set_then_get() {
        let store = SqliteStore::in_memory().await.unwrap();
        persist(&store, SyncKind::Contacts, b"A").await;

        let mut txn = store.begin_read().await.unwrap();
        let prior = LastSentFingerprints::get(&mut txn, SyncKind::Contacts)
            .await
            .unwrap();
        assert_eq!(prior, Some(Fingerprint::of(b"A")));
    }

    #[tokio::test]
    async fn later_success_overwrites() {
        let store = SqliteStore::in_memory().await.unwrap();
        persist(&store, SyncKind::Contacts, b"A").await;
        persist(&store, SyncKind::Contacts, b"B").await;

        let mut txn = store.begin_read().await.unwrap();
        let prior = LastSentFingerprints::get(&mut txn, SyncKind::Contacts)
            .await
            .unwrap();
        assert_eq!(prior, Some(Fingerprint::of(b"B")));
    }

    #[tokio::test]
    async fn kinds_are_independent() {
        let store = SqliteStore::in_memory().await.unwrap();
        persist(&store, SyncKind::Contacts, b"contacts").await;

        let mut txn = store.begin_read().await.unwrap();
        assert_eq!(
            LastSentFingerprints::get(&mut txn, SyncKind::Groups)
                .await
                .unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn uncommitted_write_is_discarded() {
        let store = SqliteStore::in_memory().await.unwrap();
        {
            let mut txn = store.begin_write().await.unwrap();
            LastSentFingerprints::set(&mut txn, SyncKind::Contacts, &Fingerprint::of(b"A"))
                .await
                .unwrap();
            // Dropped without commit
        }

        let mut txn = store.begin_read().await.unwrap();
        assert_eq!(
            LastSentFingerprints::get(&mut txn, SyncKind::Contacts)
                .await
                .unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn read_inside_write_transaction_sees_own_write() {
        let store = SqliteStore::in_memory().await.unwrap();
        let mut txn = store.begin_write().await.unwrap();
        LastSentFingerprints::set(&mut txn, SyncKind::Groups, &Fingerprint::of(b"G"))
            .await
            .unwrap();

        let seen = LastSentFingerprints::get(&mut txn, SyncKind::Groups)
            .await
            .unwrap();
        assert_eq!(seen, Some(Fingerprint::of(b"G")));
    }

    #[tokio::test]
    async fn clear_removes_row() {
        let store = SqliteStore::in_memory().await.unwrap();
        persist(&store, SyncKind::Configuration, b"C").await;

        let mut txn = store.begin_write().await.unwrap();
        assert!(LastSentFingerprints::clear(&mut txn, SyncKind::Configuration)
            .await
            .unwrap());
        assert!(!LastSentFingerprints::clear(&mut txn, SyncKind::Configuration)
            .await
            .unwrap());
        txn.commit().await.unwrap();

        let mut txn = store.begin_read().await.unwrap();
        assert_eq!(
            LastSentFingerprints::get(&mut txn, SyncKind::Configuration)
                .await
                .unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn list_returns_all_kinds_in_order() {
        let store = SqliteStore::in_memory().await.unwrap();
        persist(&store, SyncKind::Groups, b"G").await;
        persist(&store, SyncKind::Contacts, b"C").await;

        let mut txn = store.begin_read().await.unwrap();
        let rows = LastSentFingerprints::list(&mut txn).await.unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].kind, SyncKind::Contacts);
        assert_eq!(rows[0].fingerprint, Fingerprint::of(b"C"));
        assert_eq!(rows[1].kind, SyncKind::Groups);
        assert!(rows[1].sent_at > 0);
    }

    #[tokio::test]
    async fn wrong_length_fingerprint_is_corrupt() {
        let store = SqliteStore::in_memory().await.unwrap();
        let mut txn = store.begin_write().await.unwrap();
        sqlx::query(
            "INSERT INTO last_sent_fingerprints (kind, fingerprint, sent_at) VALUES ('contacts', x'0102', 0)",
        )
        .execute(txn.connection())
        .await
        .unwrap();

        let result = LastSentFingerprints::get(&mut txn, SyncKind::Contacts).await;
        assert!(matches!(result, Err(StorageError::Corrupt { .. })));
    }
}
