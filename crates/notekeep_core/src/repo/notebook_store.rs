//! Notebook namespaces.
//!
//! # Responsibility
//! - Own the root bucket `"Notebook"`.
//! - Resolve and lazily create one child bucket per notebook name.
//!
//! # Invariants
//! - Notebook buckets are only created through a `WriteTx`.
//! - Lookups never create buckets; a missing root reads as "no notebooks".
//! - Notebooks are never removed by this module.

use crate::db::{Bucket, DbResult, Tx, WriteTx};
use crate::repo::{RepoError, RepoResult};

/// Name of the root bucket holding every notebook bucket.
pub const ROOT_BUCKET: &str = "Notebook";

/// Creates the root bucket when absent.
pub fn ensure_root_bucket<'tx>(tx: &'tx WriteTx<'_>) -> DbResult<Bucket<'tx>> {
    tx.create_bucket_if_not_exists(ROOT_BUCKET.as_bytes())
}

/// Returns the bucket for notebook `name`, creating it (and the root) when
/// absent. Idempotent.
pub fn ensure_notebook_bucket<'tx>(tx: &'tx WriteTx<'_>, name: &str) -> DbResult<Bucket<'tx>> {
    ensure_root_bucket(tx)?.create_bucket_if_not_exists(name.as_bytes())
}

/// Returns the existing bucket for notebook `name`.
pub fn notebook_bucket<'tx, T: Tx>(tx: &'tx T, name: &str) -> DbResult<Option<Bucket<'tx>>> {
    match tx.bucket(ROOT_BUCKET.as_bytes())? {
        Some(root) => root.bucket(name.as_bytes()),
        None => Ok(None),
    }
}

/// Names of all notebooks, in byte order.
pub fn list_notebooks<T: Tx>(tx: &T) -> RepoResult<Vec<String>> {
    let Some(root) = tx.bucket(ROOT_BUCKET.as_bytes())? else {
        return Ok(Vec::new());
    };

    root.bucket_names()?
        .into_iter()
        .map(|name| {
            String::from_utf8(name).map_err(|err| {
                RepoError::InvalidData(format!("notebook name is not valid UTF-8: {err}"))
            })
        })
        .collect()
}
