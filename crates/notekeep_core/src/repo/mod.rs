//! Repository layer over the bucket engine.
//!
//! # Responsibility
//! - Map notebooks onto nested buckets and notes onto bucket entries.
//! - Keep bucket/SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Every repository operation runs in exactly one transaction.
//! - Write operations commit all of their mutations or none of them.
//! - A missing notebook is never a crash: reads report "absent", deletes
//!   report `NotebookNotFound`.

use crate::db::DbError;
use thiserror::Error;

pub mod codec;
pub mod note_repo;
pub mod notebook_store;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for notebook/note persistence.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("{0}")]
    Db(#[from] DbError),
    #[error("notebook not found: {0}")]
    NotebookNotFound(String),
    #[error("note serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("invalid persisted note data: {0}")]
    InvalidData(String),
    #[error("missing required table `{0}`")]
    MissingRequiredTable(&'static str),
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl RepoError {
    /// Stable machine-readable code, safe to log.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Db(_) => "db_error",
            Self::NotebookNotFound(_) => "notebook_not_found",
            Self::Serialization(_) => "serialization_failed",
            Self::InvalidData(_) => "invalid_data",
            Self::MissingRequiredTable(_) => "missing_required_table",
        }
    }
}
