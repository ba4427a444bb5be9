//! SQLite storage bootstrap, schema migrations and the bucket engine.
//!
//! # Responsibility
//! - Open and configure SQLite connections for NoteKeep core.
//! - Apply schema migrations in deterministic order.
//! - Expose nested key/value buckets with per-bucket sequences on top of the
//!   migrated tables.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - Core code must not read/write application data before migrations succeed.
//! - Bucket mutations only happen inside a `WriteTx`.

use std::time::Duration;
use thiserror::Error;

pub mod bucket;
pub mod migrations;
mod open;

pub use bucket::{Bucket, ReadTx, Tx, WriteTx};
pub use open::{open_db, open_db_in_memory, open_db_with_options};

pub type DbResult<T> = Result<T, DbError>;

/// Storage engine error.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("{0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("database schema version {db_version} is newer than supported {latest_supported}")]
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    /// A write was attempted through a read-only transaction.
    #[error("transaction is not writable")]
    TxNotWritable,
    #[error("bucket name required")]
    BucketNameRequired,
    #[error("key required")]
    KeyRequired,
    /// The bucket sequence cannot be represented by SQLite's signed integers.
    #[error("bucket sequence overflow")]
    SequenceOverflow,
    #[error("bucket {0} no longer exists")]
    BucketNotFound(i64),
}

/// Connection settings applied by [`open_db_with_options`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DbOptions {
    /// How long a connection waits on a locked database before failing.
    pub busy_timeout: Duration,
    /// Use the WAL journal so readers and the single writer do not block
    /// each other. Ignored for in-memory databases.
    pub wal: bool,
}

impl Default for DbOptions {
    fn default() -> Self {
        Self {
            busy_timeout: Duration::from_secs(5),
            wal: true,
        }
    }
}
