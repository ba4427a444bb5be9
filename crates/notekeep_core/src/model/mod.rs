//! Domain model for notebook/note records.
//!
//! # Responsibility
//! - Define the record persisted inside a notebook bucket.
//! - Own the mapping between note ids and storage keys.
//!
//! # Invariants
//! - A note id is assigned once by its notebook's sequence and never reused.
//! - Deletion is a hard delete; there are no tombstones.

pub mod note;
