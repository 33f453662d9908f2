//! SQLite store and transaction handles.

use crate::config::StorageConfig;
use crate::error::StorageError;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::{Sqlite, SqliteConnection, Transaction};
use std::path::Path;
use std::str::FromStr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// SQLite-backed transactional store.
///
/// Uses WAL mode so the long-lived read transaction used to build a payload
/// does not block the short fingerprint write of another kind.
#[derive(Clone, Debug)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) a store at the given database path.
    pub async fn new(path: &Path) -> Result<Self, StorageError> {
        Self::open(path, 4, Duration::from_secs(5)).await
    }

    /// Open a store as described by the storage config section.
    pub async fn from_config(config: &StorageConfig) -> Result<Self, StorageError> {
        Self::open(
            &config.database,
            config.max_connections.max(1),
            Duration::from_secs(config.busy_timeout_secs),
        )
        .await
    }

    async fn open(
        path: &Path,
        max_connections: u32,
        busy_timeout: Duration,
    ) -> Result<Self, StorageError> {
        if path.as_os_str().is_empty() {
            return Err(StorageError::InvalidPath {
                path: path.to_path_buf(),
            });
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(busy_timeout);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.run_migrations().await?;
        tracing::debug!("Opened store at {}", path.display());
        Ok(store)
    }

    /// Create an in-memory store (for testing).
    ///
    /// A single connection that never expires, since every new in-memory
    /// connection would see an empty database.
    pub async fn in_memory() -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str(":memory:")?
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    /// Run database migrations.
    async fn run_migrations(&self) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS last_sent_fingerprints (
                kind TEXT PRIMARY KEY,
                fingerprint BLOB NOT NULL,
                sent_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS local_thread (
                slot INTEGER PRIMARY KEY CHECK (slot = 1),
                thread_id BLOB NOT NULL,
                created_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Begin a read transaction.
    pub async fn begin_read(&self) -> Result<ReadTransaction, StorageError> {
        Ok(ReadTransaction {
            tx: self.pool.begin().await?,
        })
    }

    /// Begin a write transaction.
    ///
    /// Nothing is written unless [`WriteTransaction::commit`] is called.
    ///
    /// Takes the write lock up front (`BEGIN IMMEDIATE`), waiting up to the
    /// busy timeout. A deferred transaction that reads before writing cannot
    /// upgrade once another connection has committed, and fails with
    /// `SQLITE_BUSY_SNAPSHOT` instead of waiting.
    pub async fn begin_write(&self) -> Result<WriteTransaction, StorageError> {
        Ok(WriteTransaction {
            tx: self.pool.begin_with("BEGIN IMMEDIATE").await?,
        })
    }

    /// Close the connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Access to the connection behind a transaction handle.
///
/// Implemented by both transaction kinds so read-only queries accept either.
pub trait Transactional: Send {
    /// The connection the transaction runs on.
    fn connection(&mut self) -> &mut SqliteConnection;
}

/// A transaction used only for reads.
///
/// Dropping it rolls back, which for a read-only transaction just releases
/// the snapshot.
pub struct ReadTransaction {
    tx: Transaction<'static, Sqlite>,
}

impl ReadTransaction {
    /// End the transaction.
    pub async fn finish(self) -> Result<(), StorageError> {
        self.tx.commit().await?;
        Ok(())
    }
}

impl Transactional for ReadTransaction {
    fn connection(&mut self) -> &mut SqliteConnection {
        &mut self.tx
    }
}

impl std::fmt::Debug for ReadTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadTransaction").finish_non_exhaustive()
    }
}

/// A transaction that may write.
///
/// Dropping it without calling [`commit`](Self::commit) rolls back.
pub struct WriteTransaction {
    tx: Transaction<'static, Sqlite>,
}

impl WriteTransaction {
    /// Commit all writes.
    pub async fn commit(self) -> Result<(), StorageError> {
        self.tx.commit().await?;
        Ok(())
    }

    /// Discard all writes.
    pub async fn rollback(self) -> Result<(), StorageError> {
        self.tx.rollback().await?;
        Ok(())
    }
}

impl Transactional for WriteTransaction {
    fn connection(&mut self) -> &mut SqliteConnection {
        &mut self.tx
    }
}

impl std::fmt::Debug for WriteTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriteTransaction").finish_non_exhaustive()
    }
}

pub(crate) fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
