//! Core persistence for NoteKeep: notebooks of notes in nested key/value
//! buckets on an embedded SQLite database.
//! This crate is the single source of truth for storage invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;

pub use db::{open_db, open_db_in_memory, open_db_with_options, DbError, DbOptions, DbResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::note::{note_key, parse_note_key, Note, NoteId};
pub use repo::codec::{JsonNoteCodec, NoteCodec};
pub use repo::note_repo::{BucketNoteRepository, NoteRepository};
pub use repo::notebook_store::ROOT_BUCKET;
pub use repo::{RepoError, RepoResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
