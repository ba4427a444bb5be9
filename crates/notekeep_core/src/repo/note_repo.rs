//! Note repository contracts and bucket-backed implementation.
//!
//! # Responsibility
//! - Assign note ids from the notebook bucket's durable sequence.
//! - Provide existence checks, point reads, listing, batched inserts and
//!   batched deletes within one notebook.
//!
//! # Invariants
//! - Ids within a notebook strictly increase in assignment order and are
//!   never reused, including after deletes and reopens.
//! - `add_notes`/`delete_notes` commit the whole batch or nothing.
//! - Note keys are the decimal form of the id; `list_notes` orders by the
//!   numeric id, not by key bytes.

use crate::db::{ReadTx, WriteTx};
use crate::model::note::{note_key, parse_note_key, Note, NoteId};
use crate::repo::codec::{JsonNoteCodec, NoteCodec};
use crate::repo::notebook_store::{
    ensure_notebook_bucket, list_notebooks, notebook_bucket,
};
use crate::repo::{RepoError, RepoResult};
use log::{debug, error};
use rusqlite::Connection;
use std::time::Instant;

/// Repository interface for notebook/note operations.
pub trait NoteRepository {
    /// Returns whether note `id` exists in `notebook`. A missing notebook
    /// yields `false`.
    fn note_exists(&mut self, notebook: &str, id: NoteId) -> RepoResult<bool>;

    /// Gets one note, or `None` when the note or the notebook is missing.
    fn find_note(&mut self, notebook: &str, id: NoteId) -> RepoResult<Option<Note>>;

    /// Gets one note, or `Note::default()` when the note or the notebook is
    /// missing.
    fn get_note(&mut self, notebook: &str, id: NoteId) -> RepoResult<Note> {
        Ok(self.find_note(notebook, id)?.unwrap_or_default())
    }

    /// Inserts one note per content, in input order, creating the notebook
    /// when absent. Returns the assigned ids in input order.
    fn add_notes<S: AsRef<str>>(&mut self, notebook: &str, contents: &[S])
        -> RepoResult<Vec<NoteId>>;

    /// Deletes the given notes; ids that do not exist are skipped.
    ///
    /// # Errors
    /// - `NotebookNotFound` when `notebook` was never created.
    fn delete_notes(&mut self, notebook: &str, ids: &[NoteId]) -> RepoResult<()>;

    /// Lists all notes of `notebook` ordered by id. A missing notebook
    /// yields an empty list.
    fn list_notes(&mut self, notebook: &str) -> RepoResult<Vec<Note>>;

    /// Lists notebook names in byte order.
    fn list_notebooks(&mut self) -> RepoResult<Vec<String>>;
}

/// Note repository over the bucket engine.
pub struct BucketNoteRepository<'conn, C = JsonNoteCodec> {
    conn: &'conn mut Connection,
    codec: C,
}

impl<'conn> BucketNoteRepository<'conn, JsonNoteCodec> {
    /// Constructs a JSON-encoding repository from a migrated connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        Self::with_codec(conn, JsonNoteCodec)
    }
}

impl<'conn, C: NoteCodec> BucketNoteRepository<'conn, C> {
    /// Constructs a repository with a custom payload codec.
    ///
    /// Takes no locks; the root notebook bucket is created by the first
    /// insert.
    pub fn with_codec(conn: &'conn mut Connection, codec: C) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn, codec })
    }

    fn insert_batch<S: AsRef<str>>(
        &mut self,
        notebook: &str,
        contents: &[S],
    ) -> RepoResult<Vec<NoteId>> {
        let tx = WriteTx::begin(self.conn)?;
        let bucket = ensure_notebook_bucket(&tx, notebook)?;

        let mut ids = Vec::with_capacity(contents.len());
        for content in contents {
            let note = Note::new(bucket.next_sequence()?, content.as_ref());
            let encoded = self.codec.encode(&note)?;
            bucket.put(note.key().as_bytes(), &encoded)?;
            ids.push(note.id);
        }

        tx.commit()?;
        Ok(ids)
    }

    fn delete_batch(&mut self, notebook: &str, ids: &[NoteId]) -> RepoResult<()> {
        let tx = WriteTx::begin(self.conn)?;
        let bucket = notebook_bucket(&tx, notebook)?
            .ok_or_else(|| RepoError::NotebookNotFound(notebook.to_string()))?;

        for id in ids {
            bucket.delete(note_key(*id).as_bytes())?;
        }

        tx.commit()?;
        Ok(())
    }
}

impl<C: NoteCodec> NoteRepository for BucketNoteRepository<'_, C> {
    fn note_exists(&mut self, notebook: &str, id: NoteId) -> RepoResult<bool> {
        let tx = ReadTx::begin(self.conn)?;
        let Some(bucket) = notebook_bucket(&tx, notebook)? else {
            return Ok(false);
        };

        let key = note_key(id);
        let found = bucket.seek(key.as_bytes())?;
        Ok(matches!(found, Some((found_key, _)) if found_key == key.as_bytes()))
    }

    fn find_note(&mut self, notebook: &str, id: NoteId) -> RepoResult<Option<Note>> {
        let tx = ReadTx::begin(self.conn)?;
        let Some(bucket) = notebook_bucket(&tx, notebook)? else {
            return Ok(None);
        };

        let key = note_key(id);
        match bucket.seek(key.as_bytes())? {
            Some((found_key, value)) if found_key == key.as_bytes() => {
                decode_entry(&self.codec, &found_key, &value).map(Some)
            }
            _ => Ok(None),
        }
    }

    fn add_notes<S: AsRef<str>>(
        &mut self,
        notebook: &str,
        contents: &[S],
    ) -> RepoResult<Vec<NoteId>> {
        let started_at = Instant::now();
        let result = self.insert_batch(notebook, contents);
        match &result {
            Ok(ids) => debug!(
                "event=notes_add module=repo status=ok count={} duration_ms={}",
                ids.len(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=notes_add module=repo status=error count={} duration_ms={} error_code={}",
                contents.len(),
                started_at.elapsed().as_millis(),
                err.code()
            ),
        }
        result
    }

    fn delete_notes(&mut self, notebook: &str, ids: &[NoteId]) -> RepoResult<()> {
        let started_at = Instant::now();
        let result = self.delete_batch(notebook, ids);
        match &result {
            Ok(()) => debug!(
                "event=notes_delete module=repo status=ok count={} duration_ms={}",
                ids.len(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=notes_delete module=repo status=error count={} duration_ms={} error_code={}",
                ids.len(),
                started_at.elapsed().as_millis(),
                err.code()
            ),
        }
        result
    }

    fn list_notes(&mut self, notebook: &str) -> RepoResult<Vec<Note>> {
        let tx = ReadTx::begin(self.conn)?;
        let Some(bucket) = notebook_bucket(&tx, notebook)? else {
            return Ok(Vec::new());
        };

        let mut notes = bucket
            .entries()?
            .iter()
            .map(|(key, value)| decode_entry(&self.codec, key, value))
            .collect::<RepoResult<Vec<_>>>()?;
        // Decimal keys sort "10" before "9".
        notes.sort_by_key(|note| note.id);
        Ok(notes)
    }

    fn list_notebooks(&mut self) -> RepoResult<Vec<String>> {
        let tx = ReadTx::begin(self.conn)?;
        list_notebooks(&tx)
    }
}

fn decode_entry<C: NoteCodec>(codec: &C, key: &[u8], value: &[u8]) -> RepoResult<Note> {
    let id = parse_note_key(key).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid note key `{}`",
            String::from_utf8_lossy(key)
        ))
    })?;
    let note = codec.decode(value)?;
    if note.id != id {
        return Err(RepoError::InvalidData(format!(
            "note stored under key {id} carries id {}",
            note.id
        )));
    }
    Ok(note)
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    for table in ["buckets", "entries"] {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
