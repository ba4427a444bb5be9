//! Nested key/value buckets over the migrated `buckets`/`entries` tables.
//!
//! # Responsibility
//! - Scope SQLite transactions into read-only and read-write handles.
//! - Address nested buckets by byte-string name.
//! - Provide ordered key access, seek-to-key-or-next and a durable
//!   per-bucket sequence.
//!
//! # Invariants
//! - Keys and bucket names are stored as BLOBs and ordered by memcmp.
//! - A transaction that is dropped without `commit` is rolled back.
//! - Buckets reached through a `ReadTx` reject every mutation.
//! - A bucket sequence only moves forward; deleting keys never rewinds it.

use super::{DbError, DbResult};
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};

/// Top-level bucket lookup shared by read and write transactions.
pub trait Tx {
    /// Returns the top-level bucket with `name`, if any.
    fn bucket(&self, name: &[u8]) -> DbResult<Option<Bucket<'_>>>;
}

/// Read-only transaction with a snapshot fixed at `begin`.
pub struct ReadTx<'conn> {
    tx: Transaction<'conn>,
}

impl<'conn> ReadTx<'conn> {
    /// Starts a deferred transaction and pins its read snapshot.
    pub fn begin(conn: &'conn mut Connection) -> DbResult<Self> {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Deferred)?;
        // A deferred transaction only takes its snapshot on the first read.
        tx.query_row("SELECT COUNT(*) FROM buckets;", [], |row| {
            row.get::<_, i64>(0)
        })?;
        Ok(Self { tx })
    }
}

impl Tx for ReadTx<'_> {
    fn bucket(&self, name: &[u8]) -> DbResult<Option<Bucket<'_>>> {
        find_bucket(&self.tx, None, name, false)
    }
}

/// Read-write transaction. Holds SQLite's single writer lock from `begin`
/// until commit or drop.
pub struct WriteTx<'conn> {
    tx: Transaction<'conn>,
}

impl<'conn> WriteTx<'conn> {
    /// Starts an immediate transaction, taking the writer lock up front.
    pub fn begin(conn: &'conn mut Connection) -> DbResult<Self> {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        Ok(Self { tx })
    }

    /// Returns the top-level bucket with `name`, creating it when absent.
    pub fn create_bucket_if_not_exists(&self, name: &[u8]) -> DbResult<Bucket<'_>> {
        create_bucket_if_not_exists(&self.tx, None, name)
    }

    /// Commits every mutation made through this transaction.
    pub fn commit(self) -> DbResult<()> {
        self.tx.commit()?;
        Ok(())
    }
}

impl Tx for WriteTx<'_> {
    fn bucket(&self, name: &[u8]) -> DbResult<Option<Bucket<'_>>> {
        find_bucket(&self.tx, None, name, true)
    }
}

/// Handle to one bucket, valid for the lifetime of its transaction.
#[derive(Debug, Clone, Copy)]
pub struct Bucket<'tx> {
    conn: &'tx Connection,
    id: i64,
    writable: bool,
}

impl<'tx> Bucket<'tx> {
    /// Returns the nested bucket with `name`, if any.
    pub fn bucket(&self, name: &[u8]) -> DbResult<Option<Bucket<'tx>>> {
        find_bucket(self.conn, Some(self.id), name, self.writable)
    }

    /// Returns the nested bucket with `name`, creating it when absent.
    ///
    /// # Errors
    /// - `TxNotWritable` when the bucket belongs to a read transaction.
    /// - `BucketNameRequired` when `name` is empty.
    pub fn create_bucket_if_not_exists(&self, name: &[u8]) -> DbResult<Bucket<'tx>> {
        self.ensure_writable()?;
        create_bucket_if_not_exists(self.conn, Some(self.id), name)
    }

    /// Names of the nested buckets, in byte order.
    pub fn bucket_names(&self) -> DbResult<Vec<Vec<u8>>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM buckets WHERE parent_id = ?1 ORDER BY name ASC;")?;
        let names = stmt
            .query_map([self.id], |row| row.get::<_, Vec<u8>>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(names)
    }

    /// Returns the value stored under `key`, if any.
    pub fn get(&self, key: &[u8]) -> DbResult<Option<Vec<u8>>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM entries WHERE bucket_id = ?1 AND key = ?2;",
                params![self.id, key],
                |row| row.get::<_, Vec<u8>>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Positions at `key`, or at the next key in byte order when `key` is
    /// absent. Returns `None` past the last key.
    pub fn seek(&self, key: &[u8]) -> DbResult<Option<(Vec<u8>, Vec<u8>)>> {
        let entry = self
            .conn
            .query_row(
                "SELECT key, value
                 FROM entries
                 WHERE bucket_id = ?1 AND key >= ?2
                 ORDER BY key ASC
                 LIMIT 1;",
                params![self.id, key],
                |row| Ok((row.get::<_, Vec<u8>>(0)?, row.get::<_, Vec<u8>>(1)?)),
            )
            .optional()?;
        Ok(entry)
    }

    /// All key/value pairs in byte order of the key.
    pub fn entries(&self) -> DbResult<Vec<(Vec<u8>, Vec<u8>)>> {
        let mut stmt = self.conn.prepare(
            "SELECT key, value FROM entries WHERE bucket_id = ?1 ORDER BY key ASC;",
        )?;
        let entries = stmt
            .query_map([self.id], |row| {
                Ok((row.get::<_, Vec<u8>>(0)?, row.get::<_, Vec<u8>>(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub fn put(&self, key: &[u8], value: &[u8]) -> DbResult<()> {
        self.ensure_writable()?;
        if key.is_empty() {
            return Err(DbError::KeyRequired);
        }

        self.conn.execute(
            "INSERT INTO entries (bucket_id, key, value)
             VALUES (?1, ?2, ?3)
             ON CONFLICT (bucket_id, key) DO UPDATE SET value = excluded.value;",
            params![self.id, key, value],
        )?;
        Ok(())
    }

    /// Removes `key`. Removing an absent key is a no-op.
    pub fn delete(&self, key: &[u8]) -> DbResult<()> {
        self.ensure_writable()?;
        self.conn.execute(
            "DELETE FROM entries WHERE bucket_id = ?1 AND key = ?2;",
            params![self.id, key],
        )?;
        Ok(())
    }

    /// Current sequence value; `0` for a bucket that never issued one.
    pub fn sequence(&self) -> DbResult<u64> {
        let value = self
            .conn
            .query_row(
                "SELECT sequence FROM buckets WHERE id = ?1;",
                [self.id],
                |row| row.get::<_, i64>(0),
            )
            .optional()?
            .ok_or(DbError::BucketNotFound(self.id))?;
        u64::try_from(value).map_err(|_| DbError::SequenceOverflow)
    }

    /// Advances the bucket sequence and returns the new value.
    ///
    /// The increment is part of the enclosing transaction, so a rolled back
    /// transaction leaves the sequence untouched.
    pub fn next_sequence(&self) -> DbResult<u64> {
        self.ensure_writable()?;
        let next = self
            .sequence()?
            .checked_add(1)
            .ok_or(DbError::SequenceOverflow)?;
        let stored = i64::try_from(next).map_err(|_| DbError::SequenceOverflow)?;

        self.conn.execute(
            "UPDATE buckets SET sequence = ?2 WHERE id = ?1;",
            params![self.id, stored],
        )?;
        Ok(next)
    }

    /// Whether this handle came from a `WriteTx`.
    pub fn is_writable(&self) -> bool {
        self.writable
    }

    fn ensure_writable(&self) -> DbResult<()> {
        if self.writable {
            Ok(())
        } else {
            Err(DbError::TxNotWritable)
        }
    }
}

fn find_bucket<'tx>(
    conn: &'tx Connection,
    parent_id: Option<i64>,
    name: &[u8],
    writable: bool,
) -> DbResult<Option<Bucket<'tx>>> {
    if name.is_empty() {
        return Ok(None);
    }

    let id = conn
        .query_row(
            "SELECT id FROM buckets WHERE IFNULL(parent_id, 0) = ?1 AND name = ?2;",
            params![parent_id.unwrap_or(0), name],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    Ok(id.map(|id| Bucket { conn, id, writable }))
}

fn create_bucket_if_not_exists<'tx>(
    conn: &'tx Connection,
    parent_id: Option<i64>,
    name: &[u8],
) -> DbResult<Bucket<'tx>> {
    if name.is_empty() {
        return Err(DbError::BucketNameRequired);
    }
    if let Some(bucket) = find_bucket(conn, parent_id, name, true)? {
        return Ok(bucket);
    }

    conn.execute(
        "INSERT INTO buckets (parent_id, name) VALUES (?1, ?2);",
        params![parent_id, name],
    )?;
    Ok(Bucket {
        conn,
        id: conn.last_insert_rowid(),
        writable: true,
    })
}
